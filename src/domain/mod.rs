// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing a multi-task regression problem.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums and traits

// Task boundaries over the flat instance array
pub mod partition;

// One labelled row, and the raw table a source produces
pub mod instance;

// Activation, device and train-size choices
pub mod settings;

// Abstractions the data layer implements
pub mod traits;
