// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for each subcommand.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// Batch-by-batch streaming from examples to the sink
pub mod pipeline;

// The `encode` workflow
pub mod encode_use_case;

// The `inspect` workflow
pub mod inspect_use_case;

// The `init-checkpoint` workflow
pub mod init_use_case;
