//! CLI binary for `todo_reminders`.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the
//! library.

use std::process::ExitCode;

use clap::Parser;
use todo_reminders::cli::{run, Cli, Context};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ctx = match Context::resolve(cli.data_dir) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };
    todo_reminders::logging::init(&ctx.config.log_filter);

    let output = run(cli.command, &ctx).await;

    for msg in output.stdout {
        println!("{msg}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}
