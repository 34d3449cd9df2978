//! Resolve command: show how a mention maps onto the graph

use clap::Args;

use crate::output::{table, to_json, OutputFormat};
use crate::{AppContext, Cli};
use turnip_resolve::{MatchKind, Resolution};

#[derive(Args)]
pub struct ResolveArgs {
    /// Free-text mention
    pub mention: String,

    /// Type hint used to scope fuzzy matching
    #[arg(short = 't', long = "type")]
    pub type_hint: Option<String>,
}

pub async fn run(args: &ResolveArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let snapshot = ctx.store.snapshot();
    let ranking = ctx
        .resolver
        .explain(&args.mention, args.type_hint.as_deref(), &snapshot)?;

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&ranking)),
        OutputFormat::Table => {
            match ranking.resolution {
                Resolution::Resolved(id) => {
                    let label = snapshot.node(id).map(|n| n.label.as_str()).unwrap_or("?");
                    println!("'{}' resolves to node {} ({}) via {:?} match", args.mention, id, label, ranking.stage);
                }
                Resolution::New if ranking.ambiguous => {
                    println!("'{}' is ambiguous and would create a new node", args.mention);
                }
                Resolution::New => println!("'{}' would create a new node", args.mention),
            }

            if !ranking.candidates.is_empty() {
                let rows: Vec<Vec<String>> = ranking
                    .candidates
                    .iter()
                    .map(|c| {
                        vec![
                            c.node_id.to_string(),
                            snapshot.node(c.node_id).map(|n| n.label.clone()).unwrap_or_default(),
                            c.matched.clone(),
                            format!("{:.3}", c.score),
                            match c.kind {
                                MatchKind::Exact => "exact".to_string(),
                                MatchKind::Fuzzy => "fuzzy".to_string(),
                            },
                            c.updated_at.to_string(),
                            c.alias_count.to_string(),
                        ]
                    })
                    .collect();
                println!();
                println!(
                    "{}",
                    table(
                        &["NODE", "LABEL", "MATCHED", "SCORE", "KIND", "UPDATED", "ALIASES"],
                        &rows
                    )
                );
            }
        }
    }
    Ok(())
}
