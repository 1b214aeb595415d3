//! tweet-relay — republishes a home timeline as an HTML page and Atom feed.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  add()   ┌───────────────┐ snapshot() ┌────────────┐
//! │ poll.rs  │ ───────► │ collection.rs │ ─────────► │ present/   │
//! │ (task)   │          │ (Mutex)       │            │ html, atom │
//! └──────────┘          └───────────────┘            └────────────┘
//!      ▲                                                   ▲
//!      │ fetch(since_id)                                   │
//! ┌──────────┐                                       ┌───────────┐
//! │ source/  │                                       │ server.rs │
//! │ twitter  │                                       │  (axum)   │
//! └──────────┘                                       └───────────┘
//! ```
//!
//! * **`source/`** — the `DataSource` trait, the `Item` value type and the
//!   Twitter implementation (OAuth 1.0a signed).
//! * **`collection`** — the bounded, de-duplicated window shared between
//!   the poller and the HTTP handlers.
//! * **`poll`** — background task that fetches new items on a timer.
//! * **`present`** — HTML and Atom renderers over a snapshot.
//! * **`server`** — routes `/`, `/atom.xml` and `/health`.
//! * **`config`** — the immutable startup configuration.
//! * **`main`** — wires everything together.

mod collection;
mod config;
mod error;
mod poll;
mod present;
mod server;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collection::ItemCollection;
use config::Config;
use poll::Poller;
use server::AppState;
use source::{DataSource, TwitterSource};

#[derive(Parser)]
#[command(name = "tweet-relay")]
#[command(about = "Republish a home timeline as an HTML page and an Atom feed")]
struct Cli {
    /// JSON config file
    #[arg(long, default_value = "./config.json")]
    config: PathBuf,

    /// Listen address, overriding the config file (e.g. `localhost:8000` or `:8000`)
    #[arg(long)]
    listen: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tweet_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // -- configuration -------------------------------------------------------
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(listen) = cli.listen.as_deref() {
        config.listen = config::parse_listen(listen)?;
    }
    tracing::info!(
        max_items = config.max_items,
        poll_interval = ?config.poll.interval,
        listen = %config.listen,
        "configuration loaded"
    );

    // -- source --------------------------------------------------------------
    let source = TwitterSource::new(config.api_base.clone(), config.credentials.clone());
    source
        .verify()
        .await
        .context("verifying source credentials")?;
    tracing::info!(source = source.name(), "credentials verified");

    // -- shared state and background polling ---------------------------------
    let collection = Arc::new(ItemCollection::new(config.max_items)?);
    let poller = Poller::new(source, Arc::clone(&collection), config.poll).spawn();

    // -- HTTP ----------------------------------------------------------------
    let app = server::router(AppState::new(collection, config.feed.clone()));
    let listener = tokio::net::TcpListener::bind(config.listen.as_str())
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server")?;

    poller.abort();
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
