mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use refetch_core::Revalidator;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    // Shell completions never read configuration
    if let Command::Completions(ref args) = cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "refetch", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::resolve(&mut cli.global)?;

    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(&args, &cfg, &cli.global),
        Command::Key(args) => commands::key::handle(&args, &cli.global),
        Command::Span(args) => commands::span::handle(&args, &cli.global),

        // Everything else goes through the request engine
        cmd => {
            let revalidator = Revalidator::new(cfg.to_revalidator_config()?)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(&cmd, &revalidator, &cli.global).await
        }
    }
}
