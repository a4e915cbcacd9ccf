// SPDX-License-Identifier: MIT OR Apache-2.0
//! Style Hub 2026 trailer player
//!
//! Plays a timed scene script full screen:
//! - Kinetic typography per scene kind
//! - Procedural audio bed and one-shot cues (`audio` feature)
//! - Rising particle background that reacts to cues
//! - Scrubbable seek bar and keyboard seeking
//!
//! ```text
//! trailer [SCRIPT] [--write-config PATH]
//! ```

mod app;
mod audio;
mod background;
mod clock;
mod config;
mod renderer;
#[cfg(any(feature = "audio", test))]
mod synth;
mod theme;

use app::TrailerApp;
use clap::Parser;
use config::AppConfig;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Style Hub 2026 trailer player
///
/// Reads its config from the file named by `TRAILER_CONFIG`, else
/// `./trailer.config.ron`. Log filtering follows `RUST_LOG`.
#[derive(Parser, Debug)]
#[command(name = "trailer", version)]
struct Cli {
    /// Scene script (.ron or .json). Defaults to the built-in trailer.
    script: Option<PathBuf>,

    /// Write the effective config to this path and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("trailer_app=debug,trailer_timeline=debug,wgpu=warn,naga=warn")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting trailer player v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::discover() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &cli.write_config {
        if let Err(e) = config.save(path) {
            tracing::error!("Failed to write config to {:?}: {e}", path);
            std::process::exit(1);
        }
        tracing::info!("Wrote config to {:?}", path);
        return;
    }

    let script = match config.load_script(cli.script.as_deref()) {
        Ok(script) => script,
        Err(e) => {
            tracing::error!("Failed to load scene script: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = TrailerApp::run(config, script) {
        tracing::error!("Player crashed: {e}");
        std::process::exit(1);
    }
}
