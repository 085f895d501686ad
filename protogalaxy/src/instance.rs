//! This module defines the data model of the folding prover: the witness
//! column store, a relaxed circuit instance, and the running accumulator with
//! its folding parameters.

use crate::{
    challenge::{ChallengeTerm, RelationParameters},
    error::FoldingError,
    relation::{batched_residual_sum, RelationEvaluator},
    transcript::ProverTranscript,
};
use ark_ff::PrimeField;
use std::collections::BTreeMap;

/// A named-column store of witness polynomials in evaluation form. Every
/// column of one instance has length `circuit_size`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Witness<F>(BTreeMap<String, Vec<F>>);

impl<F> Witness<F> {
    pub fn new() -> Self {
        Witness(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, evals: Vec<F>) {
        self.0.insert(name.into(), evals);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Fallible column accessor, used while validating an instance.
    pub fn column(&self, name: &str) -> Result<&[F], FoldingError> {
        self.0
            .get(name)
            .map(|evals| evals.as_slice())
            .ok_or_else(|| {
                FoldingError::MalformedInstance(format!("missing witness column {name}"))
            })
    }

    /// Infallible column accessor for the hot paths. The witness must have
    /// been validated to hold the column.
    pub fn col(&self, name: &str) -> &[F] {
        self.0
            .get(name)
            .unwrap_or_else(|| panic!("unknown witness column {name}"))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|name| name.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[F])> {
        self.0
            .iter()
            .map(|(name, evals)| (name.as_str(), evals.as_slice()))
    }
}

impl<F> FromIterator<(String, Vec<F>)> for Witness<F> {
    fn from_iter<I: IntoIterator<Item = (String, Vec<F>)>>(iter: I) -> Self {
        Witness(iter.into_iter().collect())
    }
}

/// One relaxed circuit instance entering a folding round: sizes, public
/// inputs, witness polynomials, and the relation parameters derived for it.
///
/// Instances are read-only inputs to the round; the only mutation is
/// [ProverInstance::prepare] attaching the derived parameters and the
/// materialized auxiliary polynomials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProverInstance<F: PrimeField> {
    /// Power-of-two row count.
    pub circuit_size: usize,
    pub num_public_inputs: usize,
    /// Position of the public values within the witness rows.
    pub public_inputs_offset: usize,
    pub public_inputs: Vec<F>,
    pub witness: Witness<F>,
    /// Zero until [ProverInstance::prepare] derives the real values.
    pub relation_parameters: RelationParameters<F>,
}

impl<F: PrimeField> ProverInstance<F> {
    pub fn new(
        circuit_size: usize,
        public_inputs: Vec<F>,
        public_inputs_offset: usize,
        witness: Witness<F>,
    ) -> Self {
        ProverInstance {
            circuit_size,
            num_public_inputs: public_inputs.len(),
            public_inputs_offset,
            public_inputs,
            witness,
            relation_parameters: RelationParameters::default(),
        }
    }

    /// Check that every column in `required` is present with `expected_len`
    /// evaluations.
    pub fn validate_columns<'a>(
        &self,
        required: impl Iterator<Item = &'a str>,
        expected_len: usize,
    ) -> Result<(), FoldingError> {
        for name in required {
            let column = self.witness.column(name)?;
            if column.len() != expected_len {
                return Err(FoldingError::MalformedInstance(format!(
                    "witness column {name} has {} evaluations, expected {expected_len}",
                    column.len()
                )));
            }
        }
        Ok(())
    }

    /// Prepare this instance for folding, as instance number `index` of the
    /// round.
    ///
    /// Appends the instance sizes and public inputs to the transcript under a
    /// domain separator unique to `index`, draws the per-instance challenges
    /// `eta`, `beta`, `gamma`, and materializes the witness polynomials that
    /// depend on them. All validation happens before the first transcript
    /// append: once the transcript has advanced there is no rollback.
    pub fn prepare<R: RelationEvaluator<F>>(
        &mut self,
        index: usize,
        expected_size: usize,
        evaluator: &R,
        transcript: &mut ProverTranscript<F>,
    ) -> Result<(), FoldingError> {
        if self.circuit_size != expected_size {
            return Err(FoldingError::SizeMismatch(expected_size, self.circuit_size));
        }
        if !self.circuit_size.is_power_of_two() {
            return Err(FoldingError::MalformedInstance(format!(
                "circuit size {} is not a power of two",
                self.circuit_size
            )));
        }
        if self.public_inputs.len() != self.num_public_inputs {
            return Err(FoldingError::MalformedInstance(format!(
                "expected {} public inputs, got {}",
                self.num_public_inputs,
                self.public_inputs.len()
            )));
        }
        self.validate_columns(evaluator.witness_columns().iter().copied(), self.circuit_size)?;

        let domain_separator = index.to_string();
        transcript.send_to_verifier_u32(
            &format!("{domain_separator}_circuit_size"),
            self.circuit_size as u32,
        );
        transcript.send_to_verifier_u32(
            &format!("{domain_separator}_public_input_size"),
            self.num_public_inputs as u32,
        );
        transcript.send_to_verifier_u32(
            &format!("{domain_separator}_pub_inputs_offset"),
            self.public_inputs_offset as u32,
        );
        for (i, public_input) in self.public_inputs.iter().enumerate() {
            transcript
                .send_to_verifier_fr(&format!("{domain_separator}_public_input_{i}"), public_input);
        }

        let [eta, beta, gamma] = [ChallengeTerm::Eta, ChallengeTerm::Beta, ChallengeTerm::Gamma]
            .map(|term| transcript.get_challenge(&format!("{domain_separator}_{term}")));
        self.relation_parameters = RelationParameters { eta, beta, gamma };

        for (name, evals) in
            evaluator.materialize_auxiliary(&self.witness, &self.relation_parameters)
        {
            debug_assert_eq!(evals.len(), self.circuit_size);
            self.witness.insert(name, evals);
        }
        Ok(())
    }
}

/// The folding parameters of the accumulator: what the perturbator
/// computation consumes as the previous round's output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoldingParameters<F: PrimeField> {
    /// Challenge powers from the previous fold, one per bit of the circuit
    /// size.
    pub betas: Vec<F>,
    /// The claimed value of the pow-weighted batched residual sum of the
    /// accumulator's witness.
    pub target_sum: F,
    /// The batching challenge under which `target_sum` was last computed.
    pub alpha: F,
}

/// The running instance of the folding pipeline: a [ProverInstance] plus its
/// [FoldingParameters]. Ownership passes to the caller once a round returns;
/// the previous betas feeding the next round are threaded through this value,
/// never through global state, so independent pipelines do not interfere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accumulator<F: PrimeField> {
    pub instance: ProverInstance<F>,
    pub folding_parameters: FoldingParameters<F>,
}

impl<F: PrimeField> Accumulator<F> {
    /// The zero-history accumulator: all witness and auxiliary columns zero,
    /// zero betas, zero target sum. A valid starting point for any relation
    /// whose residual vanishes on the all-zero assignment, which holds for
    /// gate relations whose terms all carry a selector or witness factor.
    pub fn trivial<R: RelationEvaluator<F>>(circuit_size: usize, evaluator: &R) -> Self {
        assert!(circuit_size.is_power_of_two());
        let witness = evaluator
            .witness_columns()
            .iter()
            .chain(evaluator.auxiliary_columns())
            .map(|name| (name.to_string(), vec![F::zero(); circuit_size]))
            .collect();
        let instance = ProverInstance::new(circuit_size, Vec::new(), 0, witness);
        let folding_parameters = FoldingParameters {
            betas: vec![F::zero(); crate::ceil_log2(circuit_size)],
            target_sum: F::zero(),
            alpha: F::zero(),
        };
        Accumulator {
            instance,
            folding_parameters,
        }
    }

    /// The canonical instance size of the round, read from the accumulator's
    /// own polynomial length rather than recomputed from individual
    /// instances.
    pub fn instance_size(&self) -> usize {
        self.instance
            .witness
            .columns()
            .next()
            .map(|(_, evals)| evals.len())
            .unwrap_or(0)
    }

    /// Recompute the batched relation evaluation of the accumulator's witness
    /// directly and compare it with the recorded target sum. This is the
    /// decider-style diagnostic a verifier of the accumulator would run.
    pub fn check_target_sum<R: RelationEvaluator<F>>(
        &self,
        evaluator: &R,
    ) -> Result<(), FoldingError> {
        let sum = batched_residual_sum(
            evaluator,
            &self.instance.witness,
            &self.instance.relation_parameters,
            self.folding_parameters.alpha,
            &self.folding_parameters.betas,
        );
        if sum == self.folding_parameters.target_sum {
            Ok(())
        } else {
            Err(FoldingError::TargetSumMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Fp = ark_bn254::Fr;

    struct OneColumn;

    impl RelationEvaluator<Fp> for OneColumn {
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

    #[test]
    fn test_trivial_accumulator_is_consistent() {
        let accumulator = Accumulator::trivial(8, &OneColumn);
        assert_eq!(accumulator.instance_size(), 8);
        assert_eq!(accumulator.folding_parameters.betas.len(), 3);
        accumulator.check_target_sum(&OneColumn).unwrap();
    }

    #[test]
    fn test_prepare_rejects_size_mismatch() {
        let witness = [("w".to_string(), vec![Fp::from(0u64); 8])]
            .into_iter()
            .collect();
        let mut instance = ProverInstance::new(8, Vec::new(), 0, witness);
        let mut transcript = ProverTranscript::new();
        let result = instance.prepare(0, 4, &OneColumn, &mut transcript);
        assert!(matches!(result, Err(FoldingError::SizeMismatch(4, 8))));
        // nothing was appended before the failure
        assert!(transcript.proof_data().is_empty());
    }

    #[test]
    fn test_prepare_rejects_missing_column() {
        let mut instance = ProverInstance::new(4, Vec::new(), 0, Witness::new());
        let mut transcript = ProverTranscript::new();
        let result = instance.prepare(0, 4, &OneColumn, &mut transcript);
        assert!(matches!(result, Err(FoldingError::MalformedInstance(_))));
        assert!(transcript.proof_data().is_empty());
    }
}
