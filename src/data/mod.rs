// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from the raw CSV file to device-ready batches:
//
//   simulation CSV
//       │
//       ▼
//   CsvLoader         → named columns → VehicleSample (physical units)
//       │
//       ▼
//   MinMaxScaler      → fitted per column, features and targets separately
//       │
//       ▼
//   split_train_val   → seeded 80/20 partition
//       │
//       ▼
//   TractionDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   TractionBatcher   → stacks items into [N, F] / [N, T] tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the simulation CSV by column name
pub mod loader;

/// Fits and applies per-column min-max scaling
pub mod scaler;

/// Implements Burn's Dataset trait for scaled samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
