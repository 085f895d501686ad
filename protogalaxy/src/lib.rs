//! This library implements the prover of the
//! [ProtoGalaxy](https://eprint.iacr.org/2023/1106.pdf) accumulation scheme.
//! It folds several independent "relaxed" circuit instances into a single
//! accumulator instance, such that proving the accumulator implies that all
//! folded instances were individually satisfied. It implements different
//! components to achieve it:
//! - [instance]: the data model of a relaxed instance and of the running
//!   accumulator.
//! - [transcript]: a Fiat-Shamir transcript acting as the deterministic
//!   challenge oracle of one folding round.
//! - [perturbator]: the computation of the polynomial certifying the
//!   accumulator's target-sum relation.
//! - [combiner]: the step folding all instances' polynomials into the next
//!   accumulator under the drawn folding challenge.
//! - [prover]: the orchestration of a full folding round over the above.
//!
//! The library does not fix a concrete relation. Anything implementing
//! [relation::RelationEvaluator] together with its fixed column-name contract
//! can be folded; see the integration tests for a PlonKish example.
//! Commitments are out of scope: the prover operates on witness polynomial
//! values only and relies on other layers to have bound them beforehand.

pub mod challenge;
pub mod combiner;
pub mod error;
pub mod instance;
pub mod perturbator;
pub mod prover;
pub mod relation;
pub mod transcript;

pub use challenge::{ChallengeTerm, RelationParameters};
pub use combiner::combine;
pub use error::FoldingError;
pub use instance::{Accumulator, FoldingParameters, ProverInstance, Witness};
pub use perturbator::{compute_perturbator, Perturbator};
pub use prover::{FoldingResult, ProtoGalaxyProver, ProverState};
pub use relation::RelationEvaluator;
pub use transcript::ProverTranscript;

/// Returns ceil(log2(d)) but panics if d = 0.
pub fn ceil_log2(d: usize) -> usize {
    assert!(d != 0);
    let mut pow2 = 1;
    let mut ceil_log2 = 0;
    while d > pow2 {
        ceil_log2 += 1;
        pow2 = match pow2.checked_mul(2) {
            Some(x) => x,
            None => break,
        }
    }
    ceil_log2
}
