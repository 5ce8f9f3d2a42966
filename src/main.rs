//! Weekbank CLI - weekly work-unit tracking with banked-surplus carryover.

use clap::Parser;
use std::process;
use weekbank::cli::{Cli, Commands};
use weekbank::config::{self, ConfigOverrides};
use weekbank::server;
use weekbank::storage::StateStore;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("weekbank=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        backend: cli.backend,
        data_dir: cli.data_dir,
        config_path: cli.config,
    };

    if let Err(e) = run_command(cli.command, &overrides) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_command(
    command: Commands,
    overrides: &ConfigOverrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::resolve(overrides)?;
    let mut store = StateStore::open(&config)?;

    match command {
        Commands::Serve { port, host } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::start_server(store, config.sessions, &host, port))?;
        }
        Commands::Show => {
            let snapshot = store.load_or_seed();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Recalc => {
            let snapshot = store.recalc_and_save()?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Path => {
            println!("{} ({})", store.location(), store.backend_type());
        }
    }

    Ok(())
}
