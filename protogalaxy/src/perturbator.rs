//! This module computes the perturbator polynomial of one folding round.
//!
//! The accumulator's row residuals, batched under its own `alpha`, define a
//! vector of per-row errors. The perturbator is the unique polynomial `F` in
//! the folding challenge `X` such that
//!
//! ```text
//! F(X) = sum_i residual_i * prod_{j in bits(i)} (betas[j] + X * deltas[j])
//! ```
//!
//! It is obtained by a recursive halving: row errors are paired up following
//! the binary structure of the row index, each pair combined under the
//! symbolic folding variable, until one polynomial of degree
//! `log2(instance_size)` remains. The halving runs over a flat coefficient
//! arena indexed by position, one contiguous slice per node.
//!
//! `F(0)` recovers the pow-weighted batched residual sum of the accumulator,
//! which a sound accumulator records as its target sum.

use crate::{
    ceil_log2,
    error::FoldingError,
    instance::Accumulator,
    relation::{row_residuals, RelationEvaluator},
};
use ark_ff::PrimeField;
use ark_poly::{univariate::DensePolynomial, DenseUVPolynomial, Polynomial};
use rayon::prelude::*;

/// The polynomial certifying the accumulator's target-sum relation as a
/// function of the folding challenge. Computed fresh each round and discarded
/// once the folding challenge has been drawn; it is not carried into the next
/// accumulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Perturbator<F: PrimeField> {
    /// Exactly `log2(instance_size) + 1` coefficients, constant term first.
    /// Kept at full length even when leading coefficients are zero.
    pub coefficients: Vec<F>,
}

impl<F: PrimeField> Perturbator<F> {
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn evaluate(&self, point: F) -> F {
        DensePolynomial::from_coefficients_slice(&self.coefficients).evaluate(&point)
    }
}

/// Compute the perturbator of `accumulator` under the round's challenge
/// powers `deltas`.
///
/// The residuals are evaluated under the accumulator's own batching
/// challenge, the one its target sum was recorded under.
///
/// Fails with [FoldingError::TargetSumMismatch] if the constant coefficient
/// disagrees with the accumulator's recorded target sum: that indicates an
/// invalid prior accumulator, and the round must abort rather than fold the
/// corruption into the new accumulator undetectably.
pub fn compute_perturbator<F: PrimeField, R: RelationEvaluator<F>>(
    accumulator: &Accumulator<F>,
    deltas: &[F],
    evaluator: &R,
) -> Result<Perturbator<F>, FoldingError> {
    let instance_size = accumulator.instance_size();
    let log_instance_size = ceil_log2(instance_size);
    let betas = &accumulator.folding_parameters.betas;
    if betas.len() != log_instance_size {
        return Err(FoldingError::MalformedInstance(format!(
            "accumulator carries {} betas for {instance_size} rows, expected {log_instance_size}",
            betas.len()
        )));
    }
    if deltas.len() != log_instance_size {
        return Err(FoldingError::MalformedInstance(format!(
            "{} deltas drawn for {instance_size} rows, expected {log_instance_size}",
            deltas.len()
        )));
    }

    let mut arena = row_residuals(
        evaluator,
        &accumulator.instance.witness,
        &accumulator.instance.relation_parameters,
        accumulator.folding_parameters.alpha,
        instance_size,
    );

    // Level j pairs up the nodes of level j-1: parent = left + (beta_j + X
    // delta_j) * right, each node a contiguous slice of j+1 coefficients.
    let mut stride = 1;
    for (&beta, &delta) in betas.iter().zip(deltas.iter()) {
        let pairs = arena.len() / (2 * stride);
        let mut next = vec![F::zero(); pairs * (stride + 1)];
        next.par_chunks_mut(stride + 1)
            .enumerate()
            .for_each(|(pair, out)| {
                let left = &arena[2 * pair * stride..(2 * pair + 1) * stride];
                let right = &arena[(2 * pair + 1) * stride..(2 * pair + 2) * stride];
                for (c, (&l, &r)) in left.iter().zip(right.iter()).enumerate() {
                    out[c] += l + beta * r;
                    out[c + 1] += delta * r;
                }
            });
        arena = next;
        stride += 1;
    }

    let coefficients = arena;
    if coefficients[0] != accumulator.folding_parameters.target_sum {
        return Err(FoldingError::TargetSumMismatch);
    }
    Ok(Perturbator { coefficients })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        challenge::RelationParameters,
        instance::{FoldingParameters, ProverInstance, Witness},
    };
    use ark_ff::UniformRand;
    use rand::{rngs::StdRng, SeedableRng};

    type Fp = ark_bn254::Fr;

    /// Residual of a row is the row's single witness value itself.
    struct IdentityRelation;

    impl RelationEvaluator<Fp> for IdentityRelation {
        fn witness_columns(&self) -> &'static [&'static str] {
            &["w"]
        }

        fn evaluate_residual(
            &self,
            witness: &Witness<Fp>,
            row: usize,
            _parameters: &RelationParameters<Fp>,
            _alpha: Fp,
        ) -> Fp {
            witness.col("w")[row]
        }
    }

    fn accumulator_with(values: Vec<Fp>, betas: Vec<Fp>, target_sum: Fp) -> Accumulator<Fp> {
        let circuit_size = values.len();
        let witness = [("w".to_string(), values)].into_iter().collect();
        Accumulator {
            instance: ProverInstance::new(circuit_size, Vec::new(), 0, witness),
            folding_parameters: FoldingParameters {
                betas,
                target_sum,
                alpha: Fp::from(0u64),
            },
        }
    }

    #[test]
    fn test_size_two_by_hand() {
        let mut rng = StdRng::seed_from_u64(0);
        let [f0, f1, beta, delta] = std::array::from_fn(|_| Fp::rand(&mut rng));
        let accumulator = accumulator_with(vec![f0, f1], vec![beta], f0 + beta * f1);
        let perturbator = compute_perturbator(&accumulator, &[delta], &IdentityRelation).unwrap();
        assert_eq!(perturbator.coefficients, vec![f0 + beta * f1, delta * f1]);
    }

    #[test]
    fn test_size_four_matches_direct_evaluation() {
        let mut rng = StdRng::seed_from_u64(1);
        let values: Vec<Fp> = (0..4).map(|_| Fp::rand(&mut rng)).collect();
        let betas: Vec<Fp> = (0..2).map(|_| Fp::rand(&mut rng)).collect();
        let deltas: Vec<Fp> = (0..2).map(|_| Fp::rand(&mut rng)).collect();
        let target_sum = values[0]
            + betas[0] * values[1]
            + betas[1] * values[2]
            + betas[0] * betas[1] * values[3];
        let accumulator = accumulator_with(values.clone(), betas.clone(), target_sum);
        let perturbator = compute_perturbator(&accumulator, &deltas, &IdentityRelation).unwrap();
        assert_eq!(perturbator.coefficients.len(), 3);

        // F(x) must agree with the defining sum at an arbitrary point
        let x = Fp::rand(&mut rng);
        let direct = values[0]
            + (betas[0] + x * deltas[0]) * values[1]
            + (betas[1] + x * deltas[1]) * values[2]
            + (betas[0] + x * deltas[0]) * (betas[1] + x * deltas[1]) * values[3];
        assert_eq!(perturbator.evaluate(x), direct);
    }

    #[test]
    fn test_wrong_target_sum_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let values: Vec<Fp> = (0..2).map(|_| Fp::rand(&mut rng)).collect();
        let accumulator = accumulator_with(values, vec![Fp::rand(&mut rng)], Fp::from(99u64));
        let result = compute_perturbator(&accumulator, &[Fp::rand(&mut rng)], &IdentityRelation);
        assert!(matches!(result, Err(FoldingError::TargetSumMismatch)));
    }

    #[test]
    fn test_beta_count_is_validated() {
        let accumulator = accumulator_with(
            vec![Fp::from(0u64); 4],
            vec![Fp::from(1u64)],
            Fp::from(0u64),
        );
        let deltas = vec![Fp::from(1u64); 2];
        let result = compute_perturbator(&accumulator, &deltas, &IdentityRelation);
        assert!(matches!(result, Err(FoldingError::MalformedInstance(_))));
    }
}
