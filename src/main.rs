use clap::Parser;
use fun_web::{
    config::{load_config, Config},
    handlers::App,
    limits::Concurrency,
    Server,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fun_web")]
#[command(about = "A tiny HTTP server with a handful of toy endpoints", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overrides the port of `listen`
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding root.html and index.html, overrides `www_dir`
    #[arg(short, long)]
    www: Option<PathBuf>,

    /// Serve with this many worker tasks instead of one connection at a time
    #[arg(long)]
    workers: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<Config, fun_web::config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.listen.set_port(port);
        }
        if let Some(www) = self.www {
            config.www_dir = www;
        }
        if let Some(workers) = self.workers {
            config.limits.server.concurrency = Concurrency::Workers(workers);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fun_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Args::parse().into_config().inspect_err(|err| {
        tracing::error!(error = %err, "Invalid configuration");
    })?;

    tracing::info!(
        listen = %config.listen,
        www_dir = %config.www_dir.display(),
        concurrency = ?config.limits.server.concurrency,
        "fun_web v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let listener = fun_web::bind(config.listen, &config.limits.server).inspect_err(|err| {
        tracing::error!(listen = %config.listen, error = %err, "Failed to bind");
    })?;

    Server::builder()
        .listener(listener)
        .handler(App::from_config(&config)?)
        .limits(config.limits)
        .build()
        .launch()
        .await;

    Ok(())
}
