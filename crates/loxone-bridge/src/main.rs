// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loxone bridge CLI
//!
//! Reads controller events as JSON lines on stdin and writes InfluxDB Line
//! Protocol to stdout every collection interval.
//!
//! # Usage
//!
//! ```bash
//! # Run with a configuration file
//! loxone-ws-client | loxone-bridge --config bridge.toml
//!
//! # Generate example configuration file
//! loxone-bridge gen-config --output bridge.toml
//!
//! # Validate configuration and mapping document
//! loxone-bridge validate --config bridge.toml
//! ```

use clap::{Parser, Subcommand};
use loxone_bridge::logging::{self, DEFAULT_LEVEL};
use loxone_bridge::{
    BridgeConfig, BridgeState, ItemRegistry, LineProtocolSink, LinesSource, LoxoneInput,
};
use std::path::PathBuf;
use tokio::io::BufReader;

/// Loxone to InfluxDB bridge
#[derive(Parser, Debug)]
#[command(name = "loxone-bridge")]
#[command(about = "Bridge Loxone controller events to InfluxDB Line Protocol")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR, FATAL); overrides LOGLEVEL
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "bridge.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file and its mapping document
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_deref() {
        Some(level) => logging::parse_level(level).unwrap_or(DEFAULT_LEVEL),
        None => logging::level_from_env(),
    };
    logging::init(level);

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config_path = args
        .config
        .ok_or("Missing --config (or use a subcommand)")?;
    let config = BridgeConfig::from_file(&config_path)?;

    run(config).await
}

async fn run(config: BridgeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let interval = config.interval();
    let mut input = LoxoneInput::new(config)?;
    let source = LinesSource::new(BufReader::new(tokio::io::stdin()));

    input.start(&source).await?;

    let mut sink = LineProtocolSink::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                flush(&input, &mut sink)?;
                if input.state() == BridgeState::Stopped {
                    tracing::info!("Event stream ended");
                    break;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    input.stop().await;
    flush(&input, &mut sink)?;
    tracing::info!("Final statistics: {}", input.stats());

    Ok(())
}

fn flush(input: &LoxoneInput, sink: &mut LineProtocolSink) -> std::io::Result<()> {
    input.gather(sink);
    let stdout = std::io::stdout();
    sink.write_to(&mut stdout.lock())?;
    Ok(())
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = BridgeConfig::sample().to_toml()?;

    let content = format!(
        r#"# Loxone Bridge Configuration
# Generated by loxone-bridge gen-config

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = match BridgeConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    };

    let mapped = match &config.mapping_path {
        Some(path) => match loxone_bridge::mapping::load(path) {
            Ok(items) => items,
            Err(e) => {
                eprintln!("Mapping document invalid: {}", e);
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };

    let registry = ItemRegistry::from_sources(config.items.clone(), mapped);

    println!("Configuration valid!");
    println!();
    println!("Miniserver: {}", config.host);
    println!("Direct items: {}", config.items.len());
    println!("Total items: {}", registry.len());
    for item in registry.items() {
        println!(
            "  {} -> {}/{}.{}",
            item.source_id,
            item.destination,
            item.metric_name,
            item.effective_field()
        );
    }
    Ok(())
}
