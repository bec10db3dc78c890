//! `ledchain clear <module>`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ledchain_core::module_index;
use ledchain_sync::Mutation;

use super::{apply_and_send, GlobalOpts};

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Module number, starting at 1.
    pub module: i64,
}

impl ClearArgs {
    pub fn run(self, global: &GlobalOpts) -> Result<()> {
        apply_and_send(global, |count| {
            Ok(Mutation::Clear {
                index: module_index(self.module, count)?,
            })
        })?;
        println!("{} module {} cleared", "✓".green(), self.module);
        Ok(())
    }
}
