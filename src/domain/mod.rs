// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types describing what the system works with:
// vehicle samples, column layout, torque commands.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Feature/target layout and the sample type
pub mod sample;

// Abstractions implemented by the data and application layers
pub mod traits;
