//! This module orchestrates one full folding round.
//!
//! The round is strictly sequential with respect to the transcript: each
//! challenge depends on all prior appended data, so the phases run in a fixed
//! order with no rollback. Any failure aborts the whole round; there is no
//! partial-fold state, and a half-applied transcript cannot be safely
//! replayed, so the caller must discard the prover and retry with corrected
//! inputs on a fresh one.

use crate::{
    ceil_log2,
    challenge::ChallengeTerm,
    combiner::combine,
    error::FoldingError,
    instance::{Accumulator, ProverInstance},
    perturbator::compute_perturbator,
    relation::RelationEvaluator,
    transcript::ProverTranscript,
};
use ark_ff::{Field, PrimeField};
use core::iter::successors;
use log::debug;

/// The phases of one folding round, in order. Terminal on [ProverState::Folded].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProverState {
    Start,
    /// All instances processed: sizes and public inputs appended, relation
    /// parameters derived, auxiliary polynomials materialized.
    Prepared,
    /// The round challenges alpha and delta drawn, deltas derived.
    Challenged,
    /// Perturbator computed, validated against the target sum, and its
    /// non-constant coefficients published.
    Perturbed,
    FoldingChallengeDrawn,
    /// New accumulator and folding proof available.
    Folded,
}

/// Result of one folding round.
pub struct FoldingResult<F: PrimeField> {
    /// The accumulator replacing all folded instances. The next round's
    /// perturbator computation consumes its betas.
    pub new_accumulator: Accumulator<F>,
    /// The accumulated transcript byte sequence of the round, opaque to this
    /// crate, consumed by an outside verifier.
    pub folding_proof: Vec<u8>,
}

/// Derive the challenge powers `delta^(2^i)` for `i` in
/// `[0, log_instance_size)` by successive squaring.
pub fn round_challenge_pows<F: Field>(log_instance_size: usize, delta: F) -> Vec<F> {
    successors(Some(delta), |delta| Some(delta.square()))
        .take(log_instance_size)
        .collect()
}

/// Prover of one folding round. It exclusively owns the working set of
/// instances and the transcript for the duration of the round; the resulting
/// accumulator passes to the caller on success.
pub struct ProtoGalaxyProver<'a, F: PrimeField, R: RelationEvaluator<F>> {
    evaluator: &'a R,
    accumulator: Accumulator<F>,
    instances: Vec<ProverInstance<F>>,
    transcript: ProverTranscript<F>,
    state: ProverState,
}

impl<'a, F: PrimeField, R: RelationEvaluator<F>> ProtoGalaxyProver<'a, F, R> {
    pub fn new(
        evaluator: &'a R,
        accumulator: Accumulator<F>,
        instances: Vec<ProverInstance<F>>,
        transcript: ProverTranscript<F>,
    ) -> Self {
        ProtoGalaxyProver {
            evaluator,
            accumulator,
            instances,
            transcript,
            state: ProverState::Start,
        }
    }

    pub fn state(&self) -> ProverState {
        self.state
    }

    /// Prior to folding, every instance's sizes and public inputs are
    /// appended to the transcript under its own domain separator, the
    /// instance's relation parameters are derived, and the polynomials
    /// depending on them are materialized.
    fn prepare_for_folding(&mut self) -> Result<(), FoldingError> {
        let expected_size = self.accumulator.instance.circuit_size;
        if self.accumulator.instance_size() != expected_size {
            return Err(FoldingError::MalformedInstance(format!(
                "accumulator polynomials have {} rows for a declared circuit size of {expected_size}",
                self.accumulator.instance_size()
            )));
        }
        let required = self
            .evaluator
            .witness_columns()
            .iter()
            .chain(self.evaluator.auxiliary_columns())
            .copied();
        self.accumulator
            .instance
            .validate_columns(required, expected_size)?;

        for (index, instance) in self.instances.iter_mut().enumerate() {
            instance.prepare(index, expected_size, self.evaluator, &mut self.transcript)?;
        }
        self.state = ProverState::Prepared;
        debug!("prepared {} instances for folding", self.instances.len());
        Ok(())
    }

    /// Run the whole round: prepare all instances, draw the round challenges,
    /// compute and publish the perturbator, draw the folding challenge, and
    /// combine everything into the new accumulator.
    pub fn fold_instances(&mut self) -> Result<FoldingResult<F>, FoldingError> {
        assert_eq!(
            self.state,
            ProverState::Start,
            "a folding prover is single use"
        );
        assert!(!self.instances.is_empty(), "no instance to fold");

        self.prepare_for_folding()?;

        let alpha_label = ChallengeTerm::ConstraintCombiner.to_string();
        let delta_label = ChallengeTerm::FoldingBase.to_string();
        let [alpha, delta] = self
            .transcript
            .get_challenges([alpha_label.as_str(), delta_label.as_str()]);
        let instance_size = self.accumulator.instance_size();
        let log_instance_size = ceil_log2(instance_size);
        let deltas = round_challenge_pows(log_instance_size, delta);
        self.state = ProverState::Challenged;
        debug!("drew round challenges over {instance_size} rows");

        let perturbator = compute_perturbator(&self.accumulator, &deltas, self.evaluator)?;
        // The constant coefficient is implied by the already-committed target
        // sum and is not sent.
        for (idx, coefficient) in perturbator.coefficients.iter().enumerate().skip(1) {
            self.transcript
                .send_to_verifier_fr(&format!("perturbator_{idx}"), coefficient);
        }
        self.state = ProverState::Perturbed;
        debug!("published a degree {} perturbator", perturbator.degree());

        let folding_challenge = self
            .transcript
            .get_challenge(&ChallengeTerm::RelationCombiner.to_string());
        self.state = ProverState::FoldingChallengeDrawn;

        let new_accumulator = combine(
            self.evaluator,
            &self.accumulator,
            &self.instances,
            &perturbator,
            &deltas,
            alpha,
            folding_challenge,
        );
        self.state = ProverState::Folded;
        debug!("folded {} instances into the accumulator", self.instances.len());

        Ok(FoldingResult {
            new_accumulator,
            folding_proof: self.transcript.proof_data().to_vec(),
        })
    }
}
