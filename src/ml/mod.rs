// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor math lives here. The data layer hands over plain
// instances and batches; everything from the attention kernels
// to the optimiser loop is Burn code.
//
//   attention.rs → Cosine-similarity graph attention
//                  similarity → row softmax → tanh(A · X · W)
//
//   model.rs     → Two-level hierarchical encoder
//                  • Shared input encoder
//                  • Instance attention inside each task, max-pooled
//                  • Two task-level attention stages
//                  • Fusion of instance and task embeddings
//                  • One linear head per task
//
//   loss.rs      → Segmented per-task MSE and the L2 penalty
//
//   evaluator.rs → Full-set scoring on held-out data
//
//   trainer.rs   → Step loop: sampling, Adam with decaying
//                  learning rate, optional value clipping,
//                  periodic and final evaluation

pub mod attention;
pub mod evaluator;
pub mod loss;
pub mod model;
pub mod trainer;
