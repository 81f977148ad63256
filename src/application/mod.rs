// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (preparing a corpus or decoding scores).
//
// Rules for this layer:
//   - No alignment or padding logic here
//   - No UI or printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination

// Corpus preparation workflow
pub mod prepare_use_case;

// Score → triple decoding workflow
pub mod decode_use_case;
