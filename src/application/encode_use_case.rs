// ============================================================
// Layer 2 — EncodeUseCase
// ============================================================
// Orchestrates a full encoding run in order:
//
//   Step 1: Validate the configuration        (Layer 3 - domain)
//   Step 2: Load the tokenizer                (Layer 6 - infra)
//   Step 3: Rebuild the encoder + weights     (Layer 6 - infra)
//   Step 4: Resolve layers / length limit     (Layer 2 - pipeline)
//   Step 5: Stream input through the pipeline (Layers 4, 5)
//   Step 6: Close the archive, write manifest (Layer 6 - infra)
//
// Steps 1–4 raise every configuration error before the first
// sentence is read.

use anyhow::Result;
use burn::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::PathBuf, time::Instant};

use crate::application::pipeline::Pipeline;
use crate::data::loader::{count_examples, LineReader};
use crate::domain::{
    config::EncodeConfig,
    error::EncodeError,
    merge_policy::MergePolicy,
    traits::EmbeddingSink,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    manifest::RunManifest,
    sink::NpzSink,
    tokenizer_store::TokenizerStore,
};
use crate::ml::encoder::ContextualEncoder;

type CpuBackend = burn::backend::NdArray;
type GpuBackend = burn::backend::Wgpu;

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub sentences: usize,
    pub manifest:  PathBuf,
}

// ─── EncodeUseCase ────────────────────────────────────────────────────────────
pub struct EncodeUseCase {
    config: EncodeConfig,
    policy: MergePolicy,
}

impl EncodeUseCase {
    pub fn new(config: EncodeConfig) -> Result<Self> {
        let policy = config.validate()?;
        Ok(Self { config, policy })
    }

    pub fn execute(&self) -> Result<RunSummary> {
        if self.config.gpu >= 0 {
            let device = burn::backend::wgpu::WgpuDevice::DiscreteGpu(self.config.gpu as usize);
            tracing::info!("Using WGPU device: {:?}", device);
            self.execute_on::<GpuBackend>(device)
        } else {
            tracing::info!("Using CPU (ndarray) backend");
            self.execute_on::<CpuBackend>(Default::default())
        }
    }

    fn execute_on<B: Backend>(&self, device: B::Device) -> Result<RunSummary> {
        let cfg = &self.config;
        let started = Instant::now();

        // ── Step 2: Tokenizer ─────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.vocab, cfg.do_lower_case).load()?;

        // ── Step 3: Encoder ───────────────────────────────────────────────────
        let checkpoint = CheckpointManager::new(&cfg.model_config, &cfg.checkpoint);
        let model_vocab = checkpoint.load_config()?.vocab_size;
        if tokenizer.vocab_size() > model_vocab {
            // Ids past the embedding table cannot be looked up
            return Err(EncodeError::configuration(format!(
                "tokenizer vocabulary ({}) is larger than the model's vocab_size ({})",
                tokenizer.vocab_size(),
                model_vocab
            ))
            .into());
        }
        let model = checkpoint.load_model::<B>(&device)?;

        // ── Step 4: Pipeline (layer / length checks) ──────────────────────────
        let pipeline = Pipeline::new(
            &tokenizer,
            &model,
            &cfg.layers,
            self.policy,
            cfg.batch_size,
            cfg.max_sequence_length,
            device,
        )?;
        tracing::info!(
            "Encoding with policy={} layers={:?} batch_size={} max_seq_len={}",
            self.policy,
            pipeline.layers().indices(),
            cfg.batch_size,
            pipeline.max_seq_len()
        );

        // ── Step 5: Stream ────────────────────────────────────────────────────
        let total    = count_examples(&cfg.input)?;
        let progress = self.progress_bar(total);
        // A manifest from an earlier run would describe the archive we are
        // about to overwrite
        RunManifest::remove(&cfg.output)?;
        let mut sink = NpzSink::create(&cfg.output)?;

        let result = pipeline.run(LineReader::open(&cfg.input)?, &mut sink, &progress);
        progress.finish_and_clear();

        // Close the archive either way so earlier sentences stay readable
        let closed = sink.finish();
        if result.is_err() {
            tracing::warn!(
                "Run aborted; {} sentences kept in '{}'",
                sink.written(),
                cfg.output.display()
            );
        }
        let sentences = result?;
        closed?;

        // ── Step 6: Manifest ──────────────────────────────────────────────────
        let manifest = RunManifest {
            config:          cfg.clone(),
            resolved_layers: pipeline.layers().indices().to_vec(),
            hidden_size:     model.hidden_size(),
            sentences,
        }
        .save(&cfg.output)?;

        tracing::info!(
            "Wrote {} sentences to '{}' in {:.1?}",
            sentences,
            cfg.output.display(),
            started.elapsed()
        );
        Ok(RunSummary { sentences, manifest })
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if self.config.quiet {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} sentences [{elapsed_precise}<{eta_precise}]") {
            bar.set_style(style);
        }
        bar
    }
}
