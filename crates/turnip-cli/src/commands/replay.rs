//! Replay command: run a recording of turns through the pipeline

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::read_input;
use crate::output::{table, to_json, OutputFormat};
use crate::render::DotRenderer;
use crate::{AppContext, Cli};
use turnip_core::Version;
use turnip_merge::{ReplayExtractor, TurnOutcome, TurnPipeline};

#[derive(Args)]
pub struct ReplayArgs {
    /// Recording: a JSON array with one operations batch per turn
    pub file: PathBuf,

    /// Write `iteration_<i>.dot` into this directory after each applied turn
    #[arg(long)]
    pub render_dir: Option<PathBuf>,

    /// Draw nodes as boxes in rendered files
    #[arg(long)]
    pub boxed: bool,

    /// Stop at the first failed turn
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Serialize)]
struct TurnSummary {
    turn: usize,
    utterance: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<Version>,
    detail: String,
}

pub async fn run(args: &ReplayArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let content = read_input(&args.file)?;
    let extractor = ReplayExtractor::from_json(&content)?;
    let utterances = extractor.utterances().to_vec();

    if let Some(dir) = &args.render_dir {
        std::fs::create_dir_all(dir)?;
    }

    let renderer = if args.boxed {
        DotRenderer::new().boxed()
    } else {
        DotRenderer::new()
    };
    let pipeline = TurnPipeline::new(ctx.engine.clone(), extractor).with_renderer(renderer);

    let mut summaries = Vec::with_capacity(utterances.len());
    let mut render_error = None;
    for (i, utterance) in utterances.iter().enumerate() {
        let outcome = pipeline.run_turn(utterance).await;
        let summary = match outcome {
            TurnOutcome::Applied { report, artifact } => {
                if let (Some(dir), Some(dot)) = (&args.render_dir, artifact) {
                    let path = dir.join(format!("iteration_{}.dot", i));
                    match std::fs::write(&path, dot) {
                        Ok(()) => tracing::debug!("Wrote {:?}", path),
                        Err(e) => {
                            render_error =
                                Some(anyhow::anyhow!("Could not write {}: {}", path.display(), e))
                        }
                    }
                }
                TurnSummary {
                    turn: i,
                    utterance: utterance.clone(),
                    status: "applied",
                    version: Some(report.version),
                    detail: report.diff.summary(),
                }
            }
            TurnOutcome::ExtractionFailed(reason) => TurnSummary {
                turn: i,
                utterance: utterance.clone(),
                status: "extraction_failed",
                version: None,
                detail: reason,
            },
            TurnOutcome::MergeFailed { operation, reason } => TurnSummary {
                turn: i,
                utterance: utterance.clone(),
                status: "merge_failed",
                version: None,
                detail: match operation {
                    Some(index) => format!("operation {}: {}", index, reason),
                    None => reason,
                },
            },
        };

        let failed = summary.version.is_none();
        summaries.push(summary);
        if render_error.is_some() || (failed && args.fail_fast) {
            break;
        }
    }

    // Failed turns left the store untouched; committed ones are kept even
    // when rendering stopped the replay
    ctx.save().await?;

    if !cli.quiet {
        match cli.output_format() {
            OutputFormat::Json => println!("{}", to_json(&summaries)),
            OutputFormat::Table => {
                let rows: Vec<Vec<String>> = summaries
                    .iter()
                    .map(|s| {
                        vec![
                            s.turn.to_string(),
                            s.utterance.clone(),
                            s.status.to_string(),
                            s.version.map(|v| v.to_string()).unwrap_or_default(),
                            s.detail.clone(),
                        ]
                    })
                    .collect();
                println!("{}", table(&["TURN", "UTTERANCE", "STATUS", "VERSION", "DETAIL"], &rows));
            }
        }
    }

    if let Some(e) = render_error {
        return Err(e);
    }

    let failures = summaries.iter().filter(|s| s.version.is_none()).count();
    if failures > 0 {
        anyhow::bail!("{} of {} turns failed", failures, summaries.len());
    }
    Ok(())
}
