//! Kodegen Bundler App - assembles self-contained .app bundles.
//!
//! This binary builds each configured product, embeds its non-system
//! frameworks and dylibs, rewrites load paths and signs the result.

use kodegen_bundler_app::cli::{self, Args};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    // RUST_LOG still wins over --verbose
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            1
        }
    };

    process::exit(exit_code);
}
