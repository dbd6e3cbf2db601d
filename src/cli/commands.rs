// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `encode`, `inspect` and
// `init-checkpoint` and all their flags.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::domain::config::EncodeConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode every sentence of an input file into per-layer token embeddings
    Encode(EncodeArgs),

    /// Print the shape of one sentence stored in an output archive
    Inspect(InspectArgs),

    /// Write a randomly initialised checkpoint for a model config
    InitCheckpoint(InitArgs),
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Input text file, one sentence (or `a ||| b` pair) per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output .npz archive, one array per sentence keyed by its index
    #[arg(short, long)]
    pub output: PathBuf,

    /// WordPiece vocab.txt or a tokenizer.json
    #[arg(long)]
    pub vocab: PathBuf,

    /// Encoder weights (.mpk.gz record)
    #[arg(long = "model")]
    pub checkpoint: PathBuf,

    /// Encoder architecture (BERT-style config.json)
    #[arg(long = "config")]
    pub model_config: PathBuf,

    /// Encoder family
    #[arg(long, default_value = "bert")]
    pub encoder: String,

    /// How subword positions become output units:
    /// raw, wordpiece or as_input_tokens
    #[arg(long = "merge", default_value = "wordpiece")]
    pub merge_policy: String,

    /// Hidden-state indices to keep, negative counts from the top.
    /// 0 is the embedding output.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "-2")]
    pub layers: Vec<i64>,

    /// Keep the input's case (for cased vocabularies)
    #[arg(long)]
    pub no_lower_case: bool,

    #[arg(short, long, default_value_t = 32)]
    pub batch_size: usize,

    /// Longest tokenised sentence accepted, including [CLS] and [SEP].
    /// Defaults to the encoder's position limit.
    #[arg(long)]
    pub max_seq_len: Option<usize>,

    /// GPU index, -1 runs on the CPU
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub gpu: i32,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

/// The application layer never sees clap types.
impl From<EncodeArgs> for EncodeConfig {
    fn from(a: EncodeArgs) -> Self {
        EncodeConfig {
            input:               a.input,
            output:              a.output,
            vocab:               a.vocab,
            model_config:        a.model_config,
            checkpoint:          a.checkpoint,
            encoder:             a.encoder,
            merge_policy:        a.merge_policy,
            layers:              a.layers,
            do_lower_case:       !a.no_lower_case,
            batch_size:          a.batch_size,
            max_sequence_length: a.max_seq_len,
            gpu:                 a.gpu,
            quiet:               a.quiet,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Archive written by `encode`
    pub archive: PathBuf,

    #[arg(long, default_value_t = 0)]
    pub sentence: usize,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[arg(long = "config")]
    pub model_config: PathBuf,

    /// Where to write the record (.mpk.gz is appended if missing)
    #[arg(long = "model")]
    pub checkpoint: PathBuf,
}
