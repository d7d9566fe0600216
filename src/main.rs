mod bucket;
mod classify;
mod config;
mod fetch;
mod gateway;
mod net;
mod service;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use crate::bucket::SqliteStore;
use crate::fetch::{FetchRequest, Method};
use crate::gateway::{ControlMessage, ControlReply, Gateway};
use crate::net::HttpFetcher;

#[derive(Parser, Debug)]
#[command(name = "offgate")]
#[command(about = "An offline-first cache gateway for same-origin HTTP traffic")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/offgate/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run one request through the gateway and print the response
  Fetch {
    /// Absolute URL, or a path resolved against the configured origin
    url: String,

    /// HTTP method
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Treat the request as a top-level navigation
    #[arg(long)]
    navigate: bool,

    /// Accept header to send
    #[arg(long)]
    accept: Option<String>,
  },
  /// Pre-populate the cache bucket with the critical assets and activate it
  Warm,
  /// Drop every cache bucket
  ClearCache,
  /// Print the active cache version
  Version,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;

  let store = match &config.cache_path {
    Some(path) => SqliteStore::open_at(path)?,
    None => SqliteStore::open()?,
  };
  let fetcher = HttpFetcher::new()?;
  let gateway = Arc::new(Gateway::new(fetcher, store, &config)?);

  match args.command {
    Command::Warm => {
      gateway.install().await?;
      gateway.activate()?;
      println!("cache {} warmed", gateway.version());
    }
    Command::Fetch {
      url,
      method,
      navigate,
      accept,
    } => {
      gateway.activate()?;

      let method =
        Method::parse(&method).ok_or_else(|| eyre!("Unknown HTTP method: {}", method))?;
      let origin = Url::parse(&config.origin)?;
      let target = origin
        .join(&url)
        .map_err(|e| eyre!("Invalid URL {}: {}", url, e))?;

      let mut req = if navigate {
        FetchRequest::navigate(target)
      } else {
        FetchRequest::get(target)
      };
      req = req.with_method(method);
      if let Some(accept) = accept {
        req = req.with_accept(accept);
      }

      let handle = service::start(Arc::clone(&gateway));
      let resp = handle.fetch(req).await?;
      handle.stop().await?;

      println!("{} ({})", resp.status, resp.source);
      println!("{}", String::from_utf8_lossy(&resp.body));
    }
    Command::ClearCache => {
      let handle = service::start(Arc::clone(&gateway));
      let reply = handle.message(ControlMessage::ClearCache).await?;
      handle.stop().await?;
      match reply {
        Some(ControlReply::Ack) => println!("cache cleared"),
        other => return Err(eyre!("Unexpected reply: {:?}", other)),
      }
    }
    Command::Version => {
      let handle = service::start(Arc::clone(&gateway));
      let reply = handle.message(ControlMessage::GetVersion).await?;
      handle.stop().await?;
      match reply {
        Some(ControlReply::Version { version }) => println!("{}", version),
        other => return Err(eyre!("Unexpected reply: {:?}", other)),
      }
    }
  }

  Ok(())
}
