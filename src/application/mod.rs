// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per use case (training or inspecting a data file).
//
// Rules for this layer:
//   - No tensor math here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - No file parsing here (that's Layer 4)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// Data file validation and summary
pub mod inspect_use_case;
