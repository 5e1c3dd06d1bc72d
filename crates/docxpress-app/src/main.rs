// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docxpress: HTML to DOCX and PDF conversion service
//
// Entry point. Initialises logging, loads configuration, and runs the HTTP
// server until Ctrl-C.

use std::path::PathBuf;

use clap::Parser;

use docxpress_core::AppConfig;
use docxpress_server::DocxServer;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "DOCXPRESS_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind (overrides configuration)
    #[arg(long, env = "DOCXPRESS_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long, env = "DOCXPRESS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "docxpress starting");

    let mut server = DocxServer::new(config);
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    server.stop().await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
