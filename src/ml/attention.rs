// ============================================================
// Layer 5 — Graph Attention Primitives
// ============================================================
// One single-head graph attention op, shared by both levels
// of the encoder. The "graph" is fully connected: every row
// attends to every other row, weighted by cosine similarity
// in a projected space.
//
//   X' = X · W                       projection
//   S  = cos(X'_i, X'_j)             normalized_similarity
//   A  = softmax(S) along each row   attention_weights
//   out = tanh(A · X')               attend
//
// Instance level: X = hidden features of one task's rows.
// Task level:     X = one pooled embedding per task.
//
// All functions are generic over the backend, so the same code
// runs under Autodiff during training and on the inner backend
// during evaluation.

use burn::{prelude::*, tensor::activation};

/// Floor for squared row norms; keeps all-zero rows at 0 similarity.
pub const SQUARED_NORM_FLOOR: f32 = 1e-12;

/// Cosine similarity between every pair of rows: [n, d] → [n, n].
pub fn normalized_similarity<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let norms = x
        .clone()
        .powf_scalar(2.0)
        .sum_dim(1)
        .clamp_min(SQUARED_NORM_FLOOR)
        .sqrt(); // [n, 1]
    let dots  = x.clone().matmul(x.transpose());
    let scale = norms.clone().matmul(norms.transpose());
    dots / scale
}

/// Row-wise softmax. Burn subtracts the row max before exponentiating.
pub fn attention_weights<B: Backend>(scores: Tensor<B, 2>) -> Tensor<B, 2> {
    activation::softmax(scores, 1)
}

/// Attention matrix of `x` under `projection`: [n, d] × [d, k] → [n, n].
pub fn graph_attention<B: Backend>(projection: Tensor<B, 2>, x: Tensor<B, 2>) -> Tensor<B, 2> {
    attention_weights(normalized_similarity(x.matmul(projection)))
}

/// Attention-weighted aggregation of the projected rows, squashed by tanh.
pub fn attend<B: Backend>(projection: Tensor<B, 2>, x: Tensor<B, 2>) -> Tensor<B, 2> {
    let weights = graph_attention(projection.clone(), x.clone());
    activation::tanh(weights.matmul(x.matmul(projection)))
}
