//! `ledchain brightness <module> <level>`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ledchain_core::module_index;
use ledchain_sync::Mutation;

use super::{apply_and_send, GlobalOpts};

#[derive(Args, Debug)]
pub struct BrightnessArgs {
    /// Module number, starting at 1.
    pub module: i64,

    /// Intensity, 0 (dimmest) to 15.
    #[arg(allow_negative_numbers = true)]
    pub level: i64,
}

impl BrightnessArgs {
    pub fn run(self, global: &GlobalOpts) -> Result<()> {
        apply_and_send(global, |count| {
            Ok(Mutation::SetBrightness {
                index: module_index(self.module, count)?,
                level: self.level,
            })
        })?;
        println!(
            "{} module {} brightness {}",
            "✓".green(),
            self.module,
            self.level
        );
        Ok(())
    }
}
