//! `ledchain status` — what each module was last told to show.
//!
//! Reads the state file only; the bus is never opened.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ledchain_core::{font, ModuleState};
use ledchain_sync::{section_name, Session};
use ledchain_transport::DryRunTransport;

use super::open_store;

/// Arguments for `ledchain status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let store = open_store()?;
        let state_file = store.path().to_path_buf();
        let session = Session::open(store, DryRunTransport::new(io::sink()))
            .context("failed to load display state")?;

        let modules = session
            .chain()
            .modules()
            .enumerate()
            .map(|(index, state)| {
                let error = session
                    .load_failures()
                    .iter()
                    .find(|(failed, _)| *failed == index)
                    .map(|(_, err)| err.to_string());
                ModuleStatus::new(index, state, error)
            })
            .collect();
        let report = StatusReport {
            state_file,
            modules,
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(report);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReport {
    state_file: PathBuf,
    modules: Vec<ModuleStatus>,
}

#[derive(Serialize)]
struct ModuleStatus {
    module: usize,
    section: String,
    #[serde(flatten)]
    state: ModuleState,
    /// Why the saved section was ignored, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ModuleStatus {
    fn new(index: usize, state: &ModuleState, error: Option<String>) -> Self {
        Self {
            module: index + 1,
            section: section_name(index),
            state: state.clone(),
            error,
        }
    }
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "module")]
    module: usize,
    #[tabled(rename = "display")]
    display: String,
    #[tabled(rename = "brightness")]
    brightness: u8,
    #[tabled(rename = "power")]
    power: String,
    #[tabled(rename = "note")]
    note: String,
}

fn print_table(report: StatusReport) {
    println!(
        "ledchain v{} | {} modules | {}",
        env!("CARGO_PKG_VERSION"),
        report.modules.len(),
        report.state_file.display(),
    );

    let rows: Vec<StatusTableRow> = report
        .modules
        .into_iter()
        .map(|m| StatusTableRow {
            module: m.module,
            display: display_text(&m.state),
            brightness: m.state.brightness.level(),
            power: if m.state.powered {
                "on".green().to_string()
            } else {
                "off".bright_black().to_string()
            },
            note: m.error.map(|e| e.yellow().to_string()).unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// What the digits read, as text.
fn display_text(state: &ModuleState) -> String {
    state
        .displayed()
        .map(font::display_text)
        .unwrap_or_else(|| "(blank)".to_string())
}
