// SPDX-License-Identifier: GPL-3.0-only

mod config;
mod hardware;
mod logging;
mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use hwkit_core::{DeviceGraph, Predicate, VolumeCall};

use crate::config::Config;
use crate::hardware::Hardware;

/// Query and control the machine's hardware
#[derive(Debug, Parser)]
#[command(name = "hwkit-hardware")]
#[command(about = "Inspect devices, run mount/unmount/eject and watch hotplug events", long_about = None)]
struct Cli {
    /// Read devices from a fixture file instead of the running system
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Configuration file (default: $XDG_CONFIG_HOME/hwkit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListMode {
    /// Interface properties of every device
    Details,
    /// Raw registry properties of every device
    Nonportableinfo,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List device UDIs
    List {
        #[arg(value_enum)]
        mode: Option<ListMode>,
    },
    /// Show a device's interfaces in a platform neutral form
    Details { udi: String },
    /// Show a device's raw registry properties
    Nonportableinfo { udi: String },
    /// List devices matching a predicate, optionally below a parent
    Query {
        predicate: String,
        parent_udi: Option<String>,
    },
    /// Mount a volume
    Mount { udi: String },
    /// Unmount a volume
    Unmount { udi: String },
    /// Eject an optical drive
    Eject { udi: String },
    /// Print device add/remove events until interrupted
    Listen,
}

#[derive(Serialize)]
struct NonPortable<'a> {
    udi: &'a str,
    properties: &'a hwkit_types::PropertyMap,
}

#[derive(Serialize)]
struct VolumeCallDone<'a> {
    udi: &'a str,
    call: &'a str,
    success: bool,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn list(graph: &DeviceGraph, mode: Option<ListMode>, json: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    let udis = graph.udis();

    match mode {
        None if json => print_json(&udis)?,
        None => {
            for udi in &udis {
                output::write_udi(&mut out, udi)?;
            }
        }
        Some(ListMode::Details) => {
            let reports = udis
                .iter()
                .map(|udi| graph.describe(udi))
                .collect::<Result<Vec<_>, _>>()?;
            if json {
                print_json(&reports)?;
            } else {
                for report in &reports {
                    output::write_details(&mut out, report)?;
                }
            }
        }
        Some(ListMode::Nonportableinfo) => {
            let nodes = udis
                .iter()
                .map(|udi| graph.require(udi))
                .collect::<Result<Vec<_>, _>>()?;
            if json {
                let entries: Vec<_> = nodes
                    .iter()
                    .map(|node| NonPortable {
                        udi: node.udi(),
                        properties: node.properties(),
                    })
                    .collect();
                print_json(&entries)?;
            } else {
                for node in &nodes {
                    output::write_properties(&mut out, node.udi(), node.properties())?;
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}

async fn volume_call(graph: &DeviceGraph, call: VolumeCall, udi: &str, json: bool) -> Result<()> {
    graph.invoke_volume_call(call, udi).await?;
    if json {
        let name = match call {
            VolumeCall::Mount => "mount",
            VolumeCall::Unmount => "unmount",
            VolumeCall::Eject => "eject",
        };
        print_json(&VolumeCallDone {
            udi,
            call: name,
            success: true,
        })?;
    }
    Ok(())
}

async fn listen(graph: &DeviceGraph, hardware: &Hardware, json: bool) -> Result<()> {
    let stream = match &hardware.manager {
        Some(manager) => Some(manager.watch().await.context("failed to watch for devices")?),
        None => None,
    };
    let mut events = graph.subscribe();

    if !json {
        println!("Listening to add/remove events: ");
    }

    let follow = async {
        match stream {
            Some(stream) => graph.follow(stream).await,
            None => std::future::pending::<()>().await,
        }
    };

    let print = async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if json {
                        print_json(&event)?;
                    } else {
                        output::write_event(&mut io::stdout().lock(), &event)?;
                    }
                }
                Err(RecvError::Lagged(missed)) => warn!("Missed {missed} device events"),
                Err(RecvError::Closed) => return Ok::<(), anyhow::Error>(()),
            }
        }
    };

    tokio::select! {
        _ = follow => Ok(()),
        printed = print => printed,
        interrupted = tokio::signal::ctrl_c() => interrupted.context("failed to wait for Ctrl+C"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config);

    let fixture = cli.fixture.or(config.fixture.clone());
    let hardware = Hardware::open(&config.settings, fixture.as_deref()).await?;
    let graph = DeviceGraph::load(hardware.backend.clone())?;
    let json = cli.json;

    match cli.command {
        Commands::List { mode } => list(&graph, mode, json),
        Commands::Details { udi } => {
            let report = graph.describe(&udi)?;
            if json {
                print_json(&report)
            } else {
                output::write_details(&mut io::stdout().lock(), &report)?;
                Ok(())
            }
        }
        Commands::Nonportableinfo { udi } => {
            let node = graph.require(&udi)?;
            if json {
                print_json(&NonPortable {
                    udi: node.udi(),
                    properties: node.properties(),
                })
            } else {
                output::write_properties(&mut io::stdout().lock(), node.udi(), node.properties())?;
                Ok(())
            }
        }
        Commands::Query {
            predicate,
            parent_udi,
        } => {
            let predicate: Predicate = predicate.parse()?;
            let udis = graph.query(&predicate, parent_udi.as_deref());
            if json {
                print_json(&udis)
            } else {
                let mut out = io::stdout().lock();
                for udi in &udis {
                    output::write_udi(&mut out, udi)?;
                }
                Ok(())
            }
        }
        Commands::Mount { udi } => volume_call(&graph, VolumeCall::Mount, &udi, json).await,
        Commands::Unmount { udi } => volume_call(&graph, VolumeCall::Unmount, &udi, json).await,
        Commands::Eject { udi } => volume_call(&graph, VolumeCall::Eject, &udi, json).await,
        Commands::Listen => listen(&graph, &hardware, json).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_modes() {
        let cli = Cli::try_parse_from(["hwkit-hardware", "list", "nonportableinfo"]).expect("parse");
        assert!(matches!(
            cli.command,
            Commands::List {
                mode: Some(ListMode::Nonportableinfo)
            }
        ));

        let cli = Cli::try_parse_from(["hwkit-hardware", "list"]).expect("parse");
        assert!(matches!(cli.command, Commands::List { mode: None }));
    }

    #[test]
    fn global_flags_follow_the_command() {
        let cli = Cli::try_parse_from([
            "hwkit-hardware",
            "query",
            "IS StorageVolume",
            "/dev/disk0",
            "--json",
            "--fixture",
            "macbook.toml",
        ])
        .expect("parse");

        assert!(cli.json);
        assert_eq!(cli.fixture.as_deref(), Some(std::path::Path::new("macbook.toml")));
        match cli.command {
            Commands::Query {
                predicate,
                parent_udi,
            } => {
                assert_eq!(predicate, "IS StorageVolume");
                assert_eq!(parent_udi.as_deref(), Some("/dev/disk0"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["hwkit-hardware", "frobnicate"]).is_err());
    }
}
