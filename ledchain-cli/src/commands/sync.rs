//! `ledchain sync` — resend the saved state, e.g. after the chain lost power.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ledchain_sync::Mutation;

use super::{apply_and_send, GlobalOpts};

#[derive(Args, Debug)]
pub struct SyncArgs {}

impl SyncArgs {
    pub fn run(self, global: &GlobalOpts) -> Result<()> {
        let report = apply_and_send(global, |_| Ok(Mutation::Resync))?;
        println!("{} {} modules resent", "✓".green(), report.dirty_modules);
        Ok(())
    }
}
