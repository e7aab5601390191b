use clap::{Parser, Subcommand};
use datadrop::{commands, Config, FeedFormat};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "datadrop",
    version,
    about = "JSON drop box with a classified, human-readable feed"
)]
struct Cli {
    /// Config file. Defaults to ./datadrop.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Override `[server] bind`.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print the most recent records from the configured storage.
    Feed {
        #[arg(long)]
        limit: Option<usize>,
        /// text, html or json.
        #[arg(long, default_value = "text")]
        format: FeedFormat,
    },
    /// Classify one JSON payload read from FILE or stdin.
    Classify { file: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Serve { bind } => commands::serve(&config, bind).await,
        Command::Feed { limit, format } => {
            let storage = datadrop::backends::open(&config.storage).await?;
            print!("{}", commands::feed(&config, storage.as_ref(), limit, format).await?);
            Ok(())
        }
        Command::Classify { file } => {
            let input = commands::read_input(file.as_deref())?;
            println!("{}", commands::classify(&config, &input)?);
            Ok(())
        }
    }
}
