//! `ledchain modules <count>` — only the state file changes; the next
//! display command sizes its chain from it.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ledchain_sync::session::set_configured_modules;

use super::open_store;

#[derive(Args, Debug)]
pub struct ModulesArgs {
    /// Number of chained modules, 1 to 255.
    #[arg(allow_negative_numbers = true)]
    pub count: i64,
}

impl ModulesArgs {
    pub fn run(self) -> Result<()> {
        let mut store = open_store()?;
        set_configured_modules(&mut store, self.count)?;
        store
            .save()
            .with_context(|| format!("failed to save {}", store.path().display()))?;
        println!("{} chain length set to {}", "✓".green(), self.count);
        Ok(())
    }
}
