//! This module defines the capability interface a concrete relation must
//! implement to be foldable, together with the batched-residual helpers shared
//! by the perturbator and the combiner.
//!
//! The library never fixes gate types or selector semantics. A relation is
//! anything that can evaluate a residual at a row, zero iff the row satisfies
//! the relation, plus a fixed column-name contract. No shared base type or
//! virtual dispatch is required on the hot path.

use crate::{challenge::RelationParameters, instance::Witness};
use ark_ff::PrimeField;
use rayon::prelude::*;

/// Evaluation contract of a concrete circuit relation.
pub trait RelationEvaluator<F: PrimeField>: Sync {
    /// The columns the caller must supply in every instance's witness, each of
    /// length `circuit_size`.
    fn witness_columns(&self) -> &'static [&'static str];

    /// The columns materialized by [Self::materialize_auxiliary] once the
    /// relation parameters are known. Disjoint from [Self::witness_columns].
    fn auxiliary_columns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Materialize the witness polynomials whose values depend on the relation
    /// parameters (grand-product / sorted-accumulator style columns). Called
    /// once per instance, after the parameters have been derived from the
    /// transcript. Returns one entry per name in [Self::auxiliary_columns].
    fn materialize_auxiliary(
        &self,
        _witness: &Witness<F>,
        _parameters: &RelationParameters<F>,
    ) -> Vec<(&'static str, Vec<F>)> {
        Vec::new()
    }

    /// The relation residual at `row`: zero iff the row satisfies the
    /// relation. `alpha` batches the relation's sub-checks into one scalar.
    /// Pure; the witness has been validated to hold all declared columns.
    fn evaluate_residual(
        &self,
        witness: &Witness<F>,
        row: usize,
        parameters: &RelationParameters<F>,
        alpha: F,
    ) -> F;
}

/// The residual of every row of `witness`, computed in parallel over disjoint
/// row ranges.
pub fn row_residuals<F: PrimeField, R: RelationEvaluator<F>>(
    evaluator: &R,
    witness: &Witness<F>,
    parameters: &RelationParameters<F>,
    alpha: F,
    circuit_size: usize,
) -> Vec<F> {
    (0..circuit_size)
        .into_par_iter()
        .map(|row| evaluator.evaluate_residual(witness, row, parameters, alpha))
        .collect()
}

/// Expand `betas` into the `2^betas.len()` products `pow_i`, where `pow_i` is
/// the product of the `betas[j]` for every set bit `j` of `i`. These are the
/// row weights of the accumulator's target-sum relation.
pub fn pow_vector<F: PrimeField>(betas: &[F]) -> Vec<F> {
    let mut pows = Vec::with_capacity(1 << betas.len());
    pows.push(F::one());
    for &beta in betas {
        let len = pows.len();
        for i in 0..len {
            let p = pows[i] * beta;
            pows.push(p);
        }
    }
    pows
}

/// The pow-weighted sum of all row residuals of `witness` under `betas`. The
/// accumulator's invariant is that this quantity, evaluated under its own
/// parameters and betas, equals its recorded target sum.
pub fn batched_residual_sum<F: PrimeField, R: RelationEvaluator<F>>(
    evaluator: &R,
    witness: &Witness<F>,
    parameters: &RelationParameters<F>,
    alpha: F,
    betas: &[F],
) -> F {
    let circuit_size = 1 << betas.len();
    let residuals = row_residuals(evaluator, witness, parameters, alpha, circuit_size);
    let pows = pow_vector(betas);
    residuals
        .par_iter()
        .zip(pows.par_iter())
        .map(|(residual, pow)| *residual * pow)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::One;

    type Fp = ark_bn254::Fr;

    #[test]
    fn test_pow_vector_bit_products() {
        let b0 = Fp::from(3u64);
        let b1 = Fp::from(5u64);
        let pows = pow_vector(&[b0, b1]);
        assert_eq!(pows, vec![Fp::one(), b0, b1, b0 * b1]);
    }

    #[test]
    fn test_pow_vector_empty() {
        assert_eq!(pow_vector::<Fp>(&[]), vec![Fp::one()]);
    }
}
