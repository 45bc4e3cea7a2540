//! benchtrail CLI entry point.

use benchtrail_lib::cli::{self, Cli};
use benchtrail_lib::core::Result;

fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the command
    cli::execute(cli)
}
