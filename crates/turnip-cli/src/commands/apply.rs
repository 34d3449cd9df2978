//! Apply command: merge one batch of proposed operations

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::{describe_outcome, read_input};
use crate::output::{table, to_json, OutputFormat};
use crate::{AppContext, Cli};
use turnip_core::{parse_operations, Diff, Error, OperationOutcome, ProposedOperation, Version};
use turnip_merge::plan_batch;

#[derive(Args)]
pub struct ApplyArgs {
    /// Batch file: a JSON array of operations or {"operations": [...]}; `-` reads stdin
    pub file: PathBuf,

    /// Plan the batch and print the result without committing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct ApplyReport<'a> {
    graph: &'a str,
    version: Version,
    committed: bool,
    diff: &'a Diff,
    outcomes: &'a [OperationOutcome],
}

pub async fn run(args: &ApplyArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let content = read_input(&args.file)?;
    let operations = parse_operations(&content)?;
    tracing::info!(
        "Applying {} operations to graph '{}'",
        operations.len(),
        ctx.graph
    );

    if args.dry_run {
        let snapshot = ctx.store.snapshot();
        let planned = plan_batch(&operations, &snapshot, ctx.resolver.as_ref())
            .map_err(|e| merge_error(e, &operations))?;
        let report = ApplyReport {
            graph: &ctx.graph,
            version: snapshot.version(),
            committed: false,
            diff: &planned.diff,
            outcomes: &planned.outcomes,
        };
        print_report(&report, &operations, cli);
        return Ok(());
    }

    let merged = ctx
        .engine
        .apply(&operations)
        .await
        .map_err(|e| merge_error(e, &operations))?;
    ctx.save().await?;

    let report = ApplyReport {
        graph: &ctx.graph,
        version: merged.version,
        committed: true,
        diff: &merged.diff,
        outcomes: &merged.outcomes,
    };
    print_report(&report, &operations, cli);
    Ok(())
}

fn merge_error(error: Error, operations: &[ProposedOperation]) -> anyhow::Error {
    match error {
        Error::MergeFailed {
            operation: Some(index),
            reason,
        } => match operations.get(index) {
            Some(op) => anyhow::anyhow!("Batch rejected at operation {} ({}): {}", index, op, reason),
            None => anyhow::anyhow!("Batch rejected at operation {}: {}", index, reason),
        },
        other => anyhow::anyhow!("Batch rejected: {}", other),
    }
}

fn print_report(report: &ApplyReport<'_>, operations: &[ProposedOperation], cli: &Cli) {
    if cli.quiet {
        return;
    }

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(report)),
        OutputFormat::Table => {
            if report.committed {
                println!(
                    "Committed graph '{}' version {}: {}",
                    report.graph,
                    report.version,
                    report.diff.summary()
                );
            } else {
                println!(
                    "Dry run against graph '{}' version {}: {}",
                    report.graph,
                    report.version,
                    report.diff.summary()
                );
            }
            if operations.is_empty() {
                return;
            }
            let rows: Vec<Vec<String>> = operations
                .iter()
                .zip(report.outcomes)
                .enumerate()
                .map(|(i, (op, outcome))| vec![i.to_string(), op.to_string(), describe_outcome(outcome)])
                .collect();
            println!();
            println!("{}", table(&["#", "OPERATION", "OUTCOME"], &rows));
        }
    }
}
