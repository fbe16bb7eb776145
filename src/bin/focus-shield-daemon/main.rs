mod cli;
mod setup;

use clap::Parser;
use futures::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use snafu::{prelude::*, Whatever};

use crate::cli::Arguments;

#[snafu::report]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Whatever> {
    let arg = Arguments::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(arg.verbosity)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .whatever_context("Could not setup logger")?;

    let daemon = setup::bootstrap(&arg).await?;

    tokio::select! {
        res = daemon.server.serve() => {
            res.whatever_context("Server failed to serve with fatal")?;
        }
        res = shutdown_signal() => res?,
    }

    daemon.core.shutdown.shutdown().await;
    tracing::info!("Daemon stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> Result<(), Whatever> {
    let mut signals =
        Signals::new([SIGTERM, SIGINT]).whatever_context("Could not register signal handler")?;

    if let Some(signal) = signals.next().await {
        tracing::info!(signal, "Received signal, shutting down");
    }
    Ok(())
}
