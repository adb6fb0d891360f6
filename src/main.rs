use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use edgehost::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use edgehost::distribution::DistributionPlan;
use edgehost::{edge, logger, server};

#[derive(Parser)]
#[command(name = "edgehost", version, about = "Local edge host for prerendered web apps")]
struct Cli {
    /// Config file path (extension optional)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the site through the configured cache behaviours
    Serve,
    /// Print the viewer-request rewrite of each URI
    Rewrite {
        #[arg(required = true)]
        uris: Vec<String>,
    },
    /// Run the rewrite over an edge event (file or stdin) and print the request
    Event { file: Option<PathBuf> },
    /// Print the distribution plan
    Plan {
        #[arg(long, value_enum, default_value_t = PlanFormat::Json)]
        format: PlanFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PlanFormat {
    Json,
    Toml,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Rewrite { uris } => {
            for uri in uris {
                println!("{uri} -> {}", edge::rewrite_uri(&uri));
            }
        }
        Command::Event { file } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            println!("{}", edge::handle_event_json(&input)?);
        }
        Command::Plan { format } => {
            let cfg = Config::load_from(&cli.config)?;
            let plan = DistributionPlan::from_site(&cfg.site)?;
            let out = match format {
                PlanFormat::Json => plan.to_json()?,
                PlanFormat::Toml => plan.to_toml()?,
            };
            println!("{out}");
        }
        Command::Serve => serve(&cli.config)?,
    }

    Ok(())
}

fn serve(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load_from(config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async {
        let state = Arc::new(AppState::new(cfg)?);
        server::run(state).await
    })?;
    Ok(())
}
