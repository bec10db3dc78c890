//! `ledchain set <module> <number>`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ledchain_core::module_index;
use ledchain_sync::Mutation;

use super::{apply_and_send, GlobalOpts};

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Module number, starting at 1.
    pub module: i64,

    /// Number to show. Anything wider than eight digits shows as dashes.
    #[arg(allow_negative_numbers = true)]
    pub number: i32,
}

impl SetArgs {
    pub fn run(self, global: &GlobalOpts) -> Result<()> {
        apply_and_send(global, |count| {
            Ok(Mutation::SetValue {
                index: module_index(self.module, count)?,
                value: self.number,
            })
        })?;
        println!("{} module {} shows {}", "✓".green(), self.module, self.number);
        Ok(())
    }
}
