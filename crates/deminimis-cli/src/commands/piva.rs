//! P.IVA command - validate an Italian VAT number.

use clap::Args;
use console::style;

use deminimis_core::rules::{format_partita_iva, parse_partita_iva};

/// Arguments for the piva command.
#[derive(Args)]
pub struct PivaArgs {
    /// P.IVA to check (11 digits, optional IT prefix)
    #[arg(required = true)]
    value: String,
}

pub fn run(args: PivaArgs) -> anyhow::Result<()> {
    match parse_partita_iva(&args.value) {
        Ok(piva) => {
            println!(
                "{} {} is valid ({})",
                style("✓").green(),
                piva,
                format_partita_iva(&piva)
            );
            Ok(())
        }
        Err(e) => anyhow::bail!("{}", e),
    }
}
