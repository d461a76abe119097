// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Treesync CLI entrypoint.
//!
//! `replay` applies a JSON batch to an empty workspace and prints the resulting tree, `demo`
//! prints the snapshot batch of the built-in demo workspace, and `schema` prints the JSON schema
//! of a batch.

use std::error::Error;
use std::io::Read;
use std::sync::{Arc, Mutex};

use treesync::config::SyncConfig;
use treesync::convert::TypeConverter;
use treesync::model::NodeId;
use treesync::persist::SessionPersister;
use treesync::render::{render_tree, RenderOptions};
use treesync::undo::UndoCoordinator;
use treesync::{codec, helpers, schema, telemetry};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--config <path>] replay <batch.json | ->\n  \
         {program} [--config <path>] demo\n  {program} [--config <path>] schema\n\n\
         replay applies one batch to an empty workspace (root id `root`) and prints the tree.\n\
         demo prints the snapshot batch of the built-in demo workspace.\n\
         schema prints the JSON schema of a batch.\n\n\
         TREESYNC_LOG and TREESYNC_UNDO_LIMIT override the config file."
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Replay { input: String },
    Demo,
    Schema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config: Option<String>,
    command: Command,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut config = None;
    let mut command = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                if config.is_some() {
                    return Err(());
                }
                config = Some(args.next().ok_or(())?);
            }
            _ if command.is_some() => return Err(()),
            "replay" => {
                let input = args.next().ok_or(())?;
                command = Some(Command::Replay { input });
            }
            "demo" => command = Some(Command::Demo),
            "schema" => command = Some(Command::Schema),
            _ => return Err(()),
        }
    }

    Ok(CliOptions { config, command: command.ok_or(())? })
}

fn read_input(input: &str) -> std::io::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(input)
}

fn run(options: CliOptions) -> Result<(), Box<dyn Error>> {
    let mut config = match &options.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    config.apply_env()?;
    telemetry::init(&config.log_filter)?;

    let registry = Arc::new(schema::workspace_registry());
    match options.command {
        Command::Replay { input } => {
            let batch = read_input(&input)?;
            let root = NodeId::new("root")?;
            let undo = Arc::new(UndoCoordinator::from_config(&config));
            let mut workspace = schema::empty_workspace(root);
            workspace.add_listener(undo.clone());
            let graph = Arc::new(Mutex::new(workspace));
            let session = SessionPersister::new(graph.clone(), registry);
            let records = codec::decode_and_apply(&batch, &session)?;
            tracing::info!(records, undoable = undo.undo_depth(), "batch applied");

            let graph = graph.lock().map_err(|_| "graph lock poisoned")?;
            print!("{}", render_tree(&graph, &RenderOptions::default()));
        }
        Command::Demo => {
            let graph = schema::demo_workspace(&registry)?;
            let records = helpers::snapshot_records(&graph, &registry, &TypeConverter::new())?;
            let encoded = if config.pretty_batches {
                codec::encode_batch_pretty(&records)?
            } else {
                codec::encode_batch(&records)?
            };
            println!("{encoded}");
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&codec::batch_schema())?);
        }
    }
    Ok(())
}

fn main() {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "treesync".to_owned());

    let options = match parse_options(args) {
        Ok(options) => options,
        Err(()) => {
            print_usage(&program);
            std::process::exit(2);
        }
    };

    if let Err(err) = run(options) {
        eprintln!("treesync: {err}");
        std::process::exit(1);
    }
}
