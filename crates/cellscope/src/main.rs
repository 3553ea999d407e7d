mod load;
mod output;
mod telemetry;

use std::path::PathBuf;

use anyhow::Context;
use cellscope_core::config::Config;
use cellscope_core::error::CellscopeError;
use cellscope_trace::sanitize::ActorNameCodec;
use cellscope_trace::sequence::{cell_level, component_level};
use cellscope_trace::{SkipRules, SpanTree};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::load::load_spans;
use crate::output::{print_sequence_human, print_tree_human, tree_to_json};
use crate::telemetry::init_cli_tracing;

#[derive(Parser, Debug)]
#[command(name = "cellscope")]
#[command(about = "Derive sequence diagrams and call trees from cell mesh traces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true, help = "Override the sidecar auth filter operation pattern")]
    sidecar_auth_filter_pattern: Option<String>,

    #[arg(long, global = true, help = "Override the mesh mixer service pattern")]
    mixer_service_pattern: Option<String>,

    #[arg(long, global = true, help = "Actor label for spans owned by no cell")]
    gateway_actor: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Emit the mermaid sequence diagram for a trace file")]
    Sequence {
        trace_file: PathBuf,
        #[arg(long, help = "Drill down into one cell-level action")]
        action_id: Option<String>,
    },
    #[command(about = "Print the reconstructed span tree")]
    Tree { trace_file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_cli_tracing();

    let mut config = Config::load().context("loading configuration")?;
    if let Some(v) = cli.sidecar_auth_filter_pattern {
        config.sidecar_auth_filter_operation_pattern = v;
    }
    if let Some(v) = cli.mixer_service_pattern {
        config.mixer_service_pattern = v;
    }
    if let Some(v) = cli.gateway_actor {
        config.gateway_actor = v;
    }
    let rules = SkipRules::from_config(&config)?;

    match cli.command {
        Commands::Sequence {
            trace_file,
            action_id,
        } => {
            let spans = load_spans(&trace_file)?;
            let tree = SpanTree::build(&spans).context("reconstructing call tree")?;
            let codec = ActorNameCodec::default();

            let cells = cell_level(&tree, &rules, &codec, &config.gateway_actor);
            let diagram = match action_id {
                Some(id) => match component_level(&tree, &rules, &codec, &cells.action_ids, &id)
                {
                    Ok(diagram) => diagram,
                    Err(CellscopeError::DrillDownNotFound(reason)) => {
                        warn!(%reason, "drill-down target missing, showing cell-level view");
                        cells
                    }
                    Err(e) => return Err(e.into()),
                },
                None => cells,
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&diagram)?);
            } else {
                print_sequence_human(&diagram, &codec);
            }
            Ok(())
        }
        Commands::Tree { trace_file } => {
            let spans = load_spans(&trace_file)?;
            let tree = SpanTree::build(&spans).context("reconstructing call tree")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tree_to_json(&tree))?);
            } else {
                print_tree_human(&tree);
            }
            Ok(())
        }
    }
}
