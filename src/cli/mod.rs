// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap` and hands off to Layer 2.
// The only place that prints to stdout.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EncodeArgs, InitArgs, InspectArgs};

#[derive(Parser, Debug)]
#[command(
    name = "wordpiece-embed",
    version,
    about = "Extract per-layer contextual token embeddings from a BERT-style encoder."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Encode(args)         => run_encode(args),
            Commands::Inspect(args)        => run_inspect(args),
            Commands::InitCheckpoint(args) => run_init(args),
        }
    }
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    use crate::application::encode_use_case::EncodeUseCase;

    tracing::info!("Encoding sentences from: {}", args.input.display());

    let summary = EncodeUseCase::new(args.into())?.execute()?;
    println!(
        "Encoded {} sentences. Manifest: {}",
        summary.sentences,
        summary.manifest.display()
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(&args.archive).execute(args.sentence)?;
    let (layers, units, hidden) = report.shape;
    println!("sentence {} of {}", report.sentence_id, report.total);
    println!("  layers: {layers}  units: {units}  hidden: {hidden}");
    println!("  mean:   {:.6}", report.mean);
    if let Some(resolved) = report.layers {
        println!("  hidden-state indices: {resolved:?}");
    }
    Ok(())
}

fn run_init(args: InitArgs) -> Result<()> {
    use crate::application::init_use_case::InitCheckpointUseCase;

    let record = InitCheckpointUseCase::new(args.model_config, args.checkpoint).execute()?;
    println!("Checkpoint written to {}", record.display());
    Ok(())
}
