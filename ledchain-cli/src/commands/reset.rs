//! `ledchain reset`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ledchain_sync::Mutation;

use super::{apply_and_send, GlobalOpts};

#[derive(Args, Debug)]
pub struct ResetArgs {}

impl ResetArgs {
    pub fn run(self, global: &GlobalOpts) -> Result<()> {
        let report = apply_and_send(global, |_| Ok(Mutation::Reset))?;
        println!(
            "{} {} modules reset to defaults",
            "✓".green(),
            report.dirty_modules
        );
        Ok(())
    }
}
