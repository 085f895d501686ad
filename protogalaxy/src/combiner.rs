//! This module implements the combiner step of one folding round: once the
//! folding challenge has been drawn, all instances' polynomials are folded
//! into the next accumulator under Lagrange-basis weights at the challenge.
//!
//! The accumulator sits at interpolation point `0` and the k incoming
//! instances at points `1..=k`, so a folding challenge of zero leaves a
//! consistent accumulator unchanged.

use crate::{
    challenge::RelationParameters,
    instance::{Accumulator, FoldingParameters, ProverInstance, Witness},
    perturbator::Perturbator,
    relation::{batched_residual_sum, RelationEvaluator},
};
use ark_ff::PrimeField;
use itertools::izip;
use rayon::prelude::*;

/// The Lagrange basis over the interpolation points `0..num_points`,
/// evaluated at `point`.
pub fn lagrange_weights<F: PrimeField>(num_points: usize, point: F) -> Vec<F> {
    (0..num_points)
        .map(|j| {
            let x_j = F::from(j as u64);
            let mut weight = F::one();
            for m in 0..num_points {
                if m != j {
                    let x_m = F::from(m as u64);
                    weight *= (point - x_m) / (x_j - x_m);
                }
            }
            weight
        })
        .collect()
}

/// Fold `accumulator` and `instances` into the next accumulator under
/// `folding_challenge`.
///
/// All witness columns, public inputs, relation parameters and batching
/// challenges combine linearly under the Lagrange weights at the challenge.
/// The new betas are `betas[i] + folding_challenge * deltas[i]`; they are what
/// the next round's perturbator computation will consume. The new target sum
/// is the pow-weighted batched residual sum of the folded witness under the
/// folded parameters, which keeps the accumulator's invariant by
/// construction.
///
/// This step is total: the challenge has already been drawn and is not
/// re-validated here, and the inputs were validated when the round prepared
/// them.
pub fn combine<F: PrimeField, R: RelationEvaluator<F>>(
    evaluator: &R,
    accumulator: &Accumulator<F>,
    instances: &[ProverInstance<F>],
    perturbator: &Perturbator<F>,
    deltas: &[F],
    round_alpha: F,
    folding_challenge: F,
) -> Accumulator<F> {
    assert!(!instances.is_empty());
    let circuit_size = accumulator.instance_size();
    let weights = lagrange_weights(instances.len() + 1, folding_challenge);

    let participants: Vec<&ProverInstance<F>> = core::iter::once(&accumulator.instance)
        .chain(instances.iter())
        .collect();

    let mut witness = Witness::new();
    for name in accumulator.instance.witness.column_names() {
        let columns: Vec<&[F]> = participants
            .iter()
            .map(|instance| instance.witness.col(name))
            .collect();
        let evals: Vec<F> = (0..circuit_size)
            .into_par_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(weights.iter())
                    .map(|(column, weight)| column[row] * weight)
                    .sum()
            })
            .collect();
        witness.insert(name, evals);
    }

    let num_public_inputs = participants
        .iter()
        .map(|instance| instance.public_inputs.len())
        .max()
        .unwrap_or(0);
    let public_inputs: Vec<F> = (0..num_public_inputs)
        .map(|i| {
            participants
                .iter()
                .zip(weights.iter())
                .map(|(instance, weight)| {
                    instance
                        .public_inputs
                        .get(i)
                        .copied()
                        .unwrap_or_else(F::zero)
                        * weight
                })
                .sum()
        })
        .collect();

    let mut relation_parameters = RelationParameters::default();
    for (instance, weight) in participants.iter().zip(weights.iter()) {
        relation_parameters.eta += instance.relation_parameters.eta * weight;
        relation_parameters.beta += instance.relation_parameters.beta * weight;
        relation_parameters.gamma += instance.relation_parameters.gamma * weight;
    }

    // The accumulator keeps the alpha its target sum was recorded under; the
    // freshly drawn round alpha is bound to the incoming instances.
    let alpha = weights[0] * accumulator.folding_parameters.alpha
        + weights[1..]
            .iter()
            .map(|weight| *weight * round_alpha)
            .sum::<F>();

    let betas: Vec<F> = izip!(accumulator.folding_parameters.betas.iter(), deltas.iter())
        .map(|(beta, delta)| *beta + folding_challenge * delta)
        .collect();

    // The perturbator evaluated at the drawn challenge is the batched
    // residual sum of the unfolded accumulator under the new betas.
    let perturbator_eval = perturbator.evaluate(folding_challenge);
    debug_assert_eq!(
        perturbator_eval,
        batched_residual_sum(
            evaluator,
            &accumulator.instance.witness,
            &accumulator.instance.relation_parameters,
            accumulator.folding_parameters.alpha,
            &betas,
        )
    );

    let target_sum =
        batched_residual_sum(evaluator, &witness, &relation_parameters, alpha, &betas);

    // Layout fields are carried from the incoming instances, which share the
    // relation's public-input placement.
    let public_inputs_offset = instances[0].public_inputs_offset;
    let instance = ProverInstance {
        circuit_size,
        num_public_inputs: public_inputs.len(),
        public_inputs_offset,
        public_inputs,
        witness,
        relation_parameters,
    };
    Accumulator {
        instance,
        folding_parameters: FoldingParameters {
            betas,
            target_sum,
            alpha,
        },
    }
}
