//! # Bakery Console Entry Point
//!
//! ```text
//! bakery-console [CONFIG]
//!
//!   CONFIG   path to console.toml (default: platform config dir)
//! ```
//!
//! Settings can also come from `BAKERY_*` environment variables; see
//! [`bakery_console_lib::state::ConsoleConfig`].

use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    match bakery_console_lib::run(config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("bakery-console: {}", e);
            ExitCode::FAILURE
        }
    }
}
