// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Persistence and reporting used by the other layers:
//
//   checkpoint.rs - Saving and loading model weights with
//                   Burn's full-precision MessagePack recorder,
//                   plus TrainConfig as JSON.
//
//   export.rs     - Tracing the trained model into a
//                   self-contained JSON graph, and the plain
//                   Rust runtime that executes it.
//
//   metrics.rs    - Per-epoch loss and learning rate written
//                   to a CSV file.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Traced export and native runtime
pub mod export;

/// Training metrics CSV logger
pub mod metrics;
