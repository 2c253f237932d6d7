//! Scoring function variants.

use serde::{Deserialize, Serialize};

/// A scoring function together with its parameters.
///
/// The set is closed: every consumer matches exhaustively, so adding a
/// variant is a compile error everywhere a scorer is named, serialized,
/// or turned into tool arguments. The `name` field is the discriminator
/// for tagged serialization.
///
/// Equality is structural: variant plus all parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Scorer {
    /// Okapi BM25.
    Bm25 { k1: f64, b: f64 },
    /// Divergence-from-randomness PL2.
    Pl2 { c: f64 },
    /// Query likelihood with Dirichlet smoothing.
    Qld { mu: f64 },
    /// Hyper-geometric DPH (parameter-free).
    Dph,
    /// No scoring; postings carry precomputed (quantized) scores.
    Passthrough,
}

impl Scorer {
    /// The wire name of the scoring function.
    pub fn name(&self) -> &'static str {
        match self {
            Scorer::Bm25 { .. } => "bm25",
            Scorer::Pl2 { .. } => "pl2",
            Scorer::Qld { .. } => "qld",
            Scorer::Dph => "dph",
            Scorer::Passthrough => "passthrough",
        }
    }

}
