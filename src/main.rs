//! # scan-history CLI
//!
//! Command-line interface for inspecting and editing the scan history.
//!
//! ## Usage
//! ```bash
//! scan-history list
//! scan-history add "Oat milk" --result '{"grade": "B"}'
//! scan-history remove 3f2a...
//! ```

mod cli;

use scan_history::Result;

fn main() -> Result<()> {
    cli::run()
}
