use ark_ff::Zero;
use core::{
    fmt::{Display, Formatter, Result},
    ops::{Index, IndexMut},
};
use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

/// The challenges a folding round draws from the transcript, in the order they
/// are drawn. The [Display] instance gives the transcript label of each term;
/// the per-instance terms are additionally prefixed by the instance's domain
/// separator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumCountMacro)]
pub enum ChallengeTerm {
    /// Per-instance challenge used to materialize the parameter-dependent
    /// auxiliary columns (sorted-accumulator style).
    Eta,
    /// Both challenges used in the permutation-style arguments of the
    /// relation. Per-instance.
    Beta,
    Gamma,
    /// Used to aggregate the constraints describing the relation. It is used
    /// to enforce all constraints are satisfied at the same time.
    /// Often noted `α`.
    ConstraintCombiner,
    /// Base challenge of the folding round. Its successive squarings weight
    /// the rows of the perturbator computation.
    /// Often noted `δ` in the paper mentioning "folding protocols".
    FoldingBase,
    /// Used by the accumulation protocol to perform a random linear
    /// transformation of the witnesses and the public values.
    /// Often noted `γ` in the paper mentioning "folding protocols".
    RelationCombiner,
}

impl Display for ChallengeTerm {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ChallengeTerm::Eta => write!(f, "eta"),
            ChallengeTerm::Beta => write!(f, "beta"),
            ChallengeTerm::Gamma => write!(f, "gamma"),
            ChallengeTerm::ConstraintCombiner => write!(f, "alpha"),
            ChallengeTerm::FoldingBase => write!(f, "delta"),
            ChallengeTerm::RelationCombiner => write!(f, "folding_challenge"),
        }
    }
}

/// The named per-instance challenges, derived once per instance from the
/// transcript and used to materialize the permutation/lookup-style auxiliary
/// columns. Zero-initialized until the instance is prepared.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RelationParameters<F> {
    pub eta: F,
    pub beta: F,
    pub gamma: F,
}

impl<F: Zero> Default for RelationParameters<F> {
    fn default() -> Self {
        Self {
            eta: F::zero(),
            beta: F::zero(),
            gamma: F::zero(),
        }
    }
}

impl<F> Index<ChallengeTerm> for RelationParameters<F> {
    type Output = F;

    fn index(&self, term: ChallengeTerm) -> &Self::Output {
        match term {
            ChallengeTerm::Eta => &self.eta,
            ChallengeTerm::Beta => &self.beta,
            ChallengeTerm::Gamma => &self.gamma,
            _ => panic!(
                "{} is a round challenge, only {} of the {} challenge terms are relation parameters",
                term,
                3,
                ChallengeTerm::COUNT
            ),
        }
    }
}

impl<F> IndexMut<ChallengeTerm> for RelationParameters<F> {
    fn index_mut(&mut self, term: ChallengeTerm) -> &mut F {
        match term {
            ChallengeTerm::Eta => &mut self.eta,
            ChallengeTerm::Beta => &mut self.beta,
            ChallengeTerm::Gamma => &mut self.gamma,
            _ => panic!(
                "{} is a round challenge, only {} of the {} challenge terms are relation parameters",
                term,
                3,
                ChallengeTerm::COUNT
            ),
        }
    }
}
