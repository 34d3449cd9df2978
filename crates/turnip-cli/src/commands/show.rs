//! Show command: print the current graph

use clap::Args;

use super::format_attributes;
use crate::output::{table, to_json, OutputFormat};
use crate::{AppContext, Cli};
use turnip_core::NodeId;

#[derive(Args)]
pub struct ShowArgs {
    /// Print the id-free view handed to the extraction model (always JSON)
    #[arg(long)]
    pub prompt: bool,
}

pub async fn run(args: &ShowArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let snapshot = ctx.store.snapshot();

    if args.prompt {
        println!("{}", to_json(&snapshot.prompt_view()));
        return Ok(());
    }

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&*snapshot)),
        OutputFormat::Table => {
            println!(
                "Graph '{}' at version {} ({} nodes, {} edges)",
                ctx.graph,
                snapshot.version(),
                snapshot.node_count(),
                snapshot.edge_count()
            );
            if snapshot.is_empty() {
                return Ok(());
            }

            let nodes: Vec<Vec<String>> = snapshot
                .nodes()
                .map(|n| {
                    let aliases: Vec<&str> = n
                        .aliases
                        .iter()
                        .filter(|a| **a != n.label)
                        .map(String::as_str)
                        .collect();
                    vec![
                        n.id.to_string(),
                        n.label.clone(),
                        n.type_str().unwrap_or("-").to_string(),
                        aliases.join(", "),
                        format_attributes(&n.attributes),
                        n.updated_at.to_string(),
                    ]
                })
                .collect();
            println!();
            println!(
                "{}",
                table(&["ID", "LABEL", "TYPE", "ALIASES", "ATTRIBUTES", "UPDATED"], &nodes)
            );

            if snapshot.edge_count() > 0 {
                let label = |id: NodeId| {
                    snapshot
                        .node(id)
                        .map(|n| n.label.clone())
                        .unwrap_or_else(|| id.to_string())
                };
                let edges: Vec<Vec<String>> = snapshot
                    .edges()
                    .map(|e| {
                        vec![
                            e.id.to_string(),
                            label(e.source_id),
                            e.relation.clone(),
                            label(e.target_id),
                            format_attributes(&e.attributes),
                        ]
                    })
                    .collect();
                println!();
                println!(
                    "{}",
                    table(&["ID", "SOURCE", "RELATION", "TARGET", "ATTRIBUTES"], &edges)
                );
            }
        }
    }
    Ok(())
}
