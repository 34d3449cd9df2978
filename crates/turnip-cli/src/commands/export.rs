//! Export command

use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use clap::{Args, ValueEnum};

use crate::render::DotRenderer;
use crate::{AppContext, Cli};
use turnip_core::RenderAdapter;
use turnip_storage::PersistedGraph;

/// Export format
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum ExportFormat {
    /// Versioned snapshot document, loadable as a JSON graph file
    #[default]
    Json,
    /// Graphviz DOT source
    Dot,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format
    #[arg(long = "as", value_enum, default_value = "json")]
    pub export_as: ExportFormat,

    /// Draw nodes as boxes (DOT only)
    #[arg(long)]
    pub boxed: bool,
}

pub async fn run(args: &ExportArgs, _cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let snapshot = ctx.store.snapshot();
    tracing::info!(
        "Exporting graph '{}' at version {}",
        ctx.graph,
        snapshot.version()
    );

    let content = match args.export_as {
        ExportFormat::Json => {
            let bytes = PersistedGraph::new(snapshot.as_ref().clone()).encode()?;
            String::from_utf8(bytes)?
        }
        ExportFormat::Dot => {
            let renderer = if args.boxed {
                DotRenderer::new().boxed()
            } else {
                DotRenderer::new()
            };
            renderer.render(&snapshot)?
        }
    };

    if let Some(ref path) = args.output {
        // Write with secure permissions (0o600 = owner read/write only)
        #[cfg(unix)]
        {
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)?;
            file.write_all(content.as_bytes())?;
        }
        #[cfg(not(unix))]
        {
            std::fs::write(path, &content)?;
        }
        println!("Exported to {:?}", path);
    } else {
        print!("{}", content);
        if !content.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
