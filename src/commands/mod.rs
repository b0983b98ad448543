pub mod check;
pub mod repl;
pub mod run;

use clap::Args;

use crate::config::Config;
use crate::tape::CellArithmetic;

/// Tape settings shared by every subcommand that executes code.
#[derive(Args, Debug, Default, Clone)]
pub struct TapeArgs {
    /// Number of tape cells (fallback BF_TAPE_SIZE; default 30000)
    #[arg(long = "tape-size", value_name = "N")]
    pub tape_size: Option<usize>,

    /// Wrap cell values modulo 256 instead of saturating at 0 and 255
    #[arg(long = "wrap")]
    pub wrap: bool,
}

impl TapeArgs {
    /// Load config file and environment, then apply these flags on top.
    pub fn resolve(&self) -> Config {
        let mut config = Config::load();
        if let Some(size) = self.tape_size {
            config.tape_size = size;
        }
        if self.wrap {
            config.arithmetic = CellArithmetic::Wrapping;
        }
        config
    }
}
