//! This module implements the Fiat-Shamir transcript of one folding round.
//!
//! The transcript is a deterministic challenge oracle: every value sent to the
//! verifier is absorbed, together with its label, into a running Blake2b512
//! chaining state, and every challenge is squeezed from that state. A
//! challenge therefore depends on all previously appended data, and two
//! distinct labels yield distinct challenges by construction.
//!
//! The transcript is append-only. There is no rollback: once a value has been
//! absorbed the state has advanced irreversibly, which is what binds the
//! derived challenges to the append order.

use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use blake2::{Blake2b512, Digest};
use core::marker::PhantomData;

/// Prover side of the Fiat-Shamir transcript. Exclusively owned and
/// sequentially mutated by the folding prover for the lifetime of one round;
/// it must not be shared across concurrent rounds.
pub struct ProverTranscript<F: PrimeField> {
    /// Blake2b512 chaining value over all absorbed data.
    state: [u8; 64],
    /// The prover messages accumulated so far, in append order. This is the
    /// `folding_proof` handed to the verifier; challenges are not part of it
    /// as the verifier re-derives them.
    proof_data: Vec<u8>,
    _field: PhantomData<F>,
}

impl<F: PrimeField> ProverTranscript<F> {
    pub fn new() -> Self {
        let mut h = Blake2b512::new();
        h.update(b"protogalaxy_transcript");
        Self {
            state: h.finalize().into(),
            proof_data: Vec::new(),
            _field: PhantomData,
        }
    }

    fn absorb(&mut self, label: &str, bytes: &[u8]) {
        let mut h = Blake2b512::new();
        h.update(self.state);
        h.update(label.as_bytes());
        h.update(bytes);
        self.state = h.finalize().into();
    }

    /// Append a labelled field element. The element is absorbed into the
    /// state and its compressed serialization becomes part of the proof data.
    pub fn send_to_verifier_fr(&mut self, label: &str, value: &F) {
        let mut bytes = Vec::new();
        value
            .serialize_compressed(&mut bytes)
            .expect("serializing into a byte vector cannot fail");
        self.absorb(label, &bytes);
        self.proof_data.extend_from_slice(&bytes);
    }

    /// Append a labelled u32, big endian.
    pub fn send_to_verifier_u32(&mut self, label: &str, value: u32) {
        let bytes = value.to_be_bytes();
        self.absorb(label, &bytes);
        self.proof_data.extend_from_slice(&bytes);
    }

    /// Derive one labelled challenge, consuming all prior appended state.
    /// Squeezing advances the state, so consecutive challenges differ even
    /// under the same label.
    pub fn get_challenge(&mut self, label: &str) -> F {
        let mut h = Blake2b512::new();
        h.update(self.state);
        h.update(b"challenge");
        h.update(label.as_bytes());
        let digest: [u8; 64] = h.finalize().into();
        self.state = digest;
        F::from_le_bytes_mod_order(&digest)
    }

    /// Derive one challenge per label, in order.
    pub fn get_challenges<const N: usize>(&mut self, labels: [&str; N]) -> [F; N] {
        labels.map(|label| self.get_challenge(label))
    }

    /// The accumulated byte sequence of prover messages.
    pub fn proof_data(&self) -> &[u8] {
        &self.proof_data
    }
}

impl<F: PrimeField> Default for ProverTranscript<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use rand::{rngs::StdRng, SeedableRng};

    type Fp = ark_bn254::Fr;

    #[test]
    fn test_deterministic_replay() {
        let mut rng = StdRng::seed_from_u64(42);
        let x = Fp::rand(&mut rng);
        let run = || {
            let mut t = ProverTranscript::<Fp>::new();
            t.send_to_verifier_u32("0_circuit_size", 4);
            t.send_to_verifier_fr("0_public_input_0", &x);
            let c: Fp = t.get_challenge("alpha");
            (c, t.proof_data().to_vec())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_labels_separate_challenges() {
        let mut t1 = ProverTranscript::<Fp>::new();
        let mut t2 = ProverTranscript::<Fp>::new();
        assert_ne!(t1.get_challenge("0_eta"), t2.get_challenge("1_eta"));
    }

    #[test]
    fn test_challenge_depends_on_appends() {
        let mut t1 = ProverTranscript::<Fp>::new();
        let mut t2 = ProverTranscript::<Fp>::new();
        t1.send_to_verifier_u32("0_circuit_size", 4);
        t2.send_to_verifier_u32("0_circuit_size", 8);
        assert_ne!(t1.get_challenge("alpha"), t2.get_challenge("alpha"));
    }

    #[test]
    fn test_consecutive_challenges_differ() {
        let mut t = ProverTranscript::<Fp>::new();
        let [a, b] = t.get_challenges(["alpha", "alpha"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_proof_data_contains_only_messages() {
        let mut t = ProverTranscript::<Fp>::new();
        t.send_to_verifier_u32("0_circuit_size", 4);
        let before = t.proof_data().len();
        let _: Fp = t.get_challenge("alpha");
        assert_eq!(t.proof_data().len(), before);
    }
}
