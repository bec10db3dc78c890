//! `ledchain on <module>` and `ledchain off <module>`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ledchain_core::module_index;
use ledchain_sync::Mutation;

use super::{apply_and_send, GlobalOpts};

#[derive(Args, Debug)]
pub struct PowerArgs {
    /// Module number, starting at 1.
    pub module: i64,
}

impl PowerArgs {
    pub fn run(self, global: &GlobalOpts, on: bool) -> Result<()> {
        apply_and_send(global, |count| {
            Ok(Mutation::SetPower {
                index: module_index(self.module, count)?,
                on,
            })
        })?;
        let state = if on { "on" } else { "off" };
        println!("{} module {} {state}", "✓".green(), self.module);
        Ok(())
    }
}
