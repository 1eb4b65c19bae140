//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use env_logger::{Builder, Env, Target};

fn main() {
    init_logging();
    if let Err(err) = stopwise_cli::run() {
        eprintln!("stopwise: {err}");
        std::process::exit(1);
    }
}

/// Log to stderr so stdout carries only command output. `RUST_LOG` overrides
/// the default `info` filter.
fn init_logging() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();
}
