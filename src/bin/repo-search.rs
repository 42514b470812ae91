#[macro_use]
extern crate log;

use std::env;
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::process;
use std::sync::Arc;

use chrono::Local;
use env_logger::Builder;
use failure::{Error, ResultExt};
use log::LevelFilter;
use repo_search::{Config, GitHub, Relay, SqliteStore};
use structopt::StructOpt;

const DEFAULT_CONFIG: &str = "~/.repo-search.toml";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::from_args();

    if args.example_config {
        generate_example();
        return;
    }

    if let Err(e) = run(&args).await {
        eprintln!("Error: {}", e);

        for cause in e.iter_chain().skip(1) {
            eprintln!("\tCaused By: {}", cause);
        }

        process::exit(1);
    }
}

fn generate_example() {
    let example = Config::example();

    println!("{}", example.as_toml());
}

async fn run(args: &Args) -> Result<(), Error> {
    initialize_logging(args)?;
    let cfg = args.config()?;

    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", cfg).lines() {
            debug!("{}", line);
        }
    }

    let store = if cfg.database.is_in_memory() {
        SqliteStore::in_memory()?
    } else {
        SqliteStore::open(&cfg.database.path)?
    };
    let provider = GitHub::with_config(cfg.github.clone());
    let relay = Relay::new(Arc::new(provider), Arc::new(store));

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cfg.server.port));
    repo_search::server::serve(relay, addr, shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(_) => info!("Received Ctrl-C, shutting down"),
        Err(e) => warn!("Unable to listen for Ctrl-C, {}", e),
    }
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
struct Args {
    #[structopt(
        short = "c",
        long = "config",
        default_value = "~/.repo-search.toml",
        help = "The configuration file to use."
    )]
    config_file: String,
    #[structopt(
        short = "p",
        long = "port",
        help = "The port to listen on (overrides the config and $PORT)"
    )]
    port: Option<u16>,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Verbose output (repeat for more verbosity)"
    )]
    verbosity: u64,
    #[structopt(
        long = "example-config",
        help = "Generate an example config and immediately exit."
    )]
    example_config: bool,
}

impl Args {
    pub fn config(&self) -> Result<Config, Error> {
        let config_file =
            shellexpand::full(&self.config_file).context("Unable to expand wildcards")?;
        let path = Path::new(&*config_file);

        let mut cfg = if path.exists() || self.config_file != DEFAULT_CONFIG {
            Config::from_file(path).context("Couldn't load the config")?
        } else {
            debug!("{} doesn't exist, using the defaults", path.display());
            Config::default()
        };

        cfg.apply_env()
            .context("Couldn't apply environment overrides")?;

        if let Some(port) = self.port {
            cfg.server.port = port;
        }

        Ok(cfg)
    }
}

/// Every module of the crate logs at the same level.
fn verbosity_level(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();
    builder.filter(Some("repo_search"), verbosity_level(args.verbosity));

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.format(|out, record| match record.line() {
        Some(line) => writeln!(
            out,
            "{} [{:5}] ({}#{}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            line,
            record.args()
        ),
        None => writeln!(
            out,
            "{} [{:5}] ({}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        ),
    });

    builder.try_init()?;

    Ok(())
}
