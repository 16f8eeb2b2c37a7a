//! Search over transition sequences.
//!
//! Both decoders ask an [`ActionScorer`] for one score per legal action and accumulate
//! those scores along a sequence. Scores are used as given; no normalization is applied.

use slog::{Discard, Logger};

pub use self::beam::BeamDecoder;
pub use self::greedy::GreedyDecoder;

use super::transition::{State, Transition};
use super::{DependencyTree, Error};

mod beam;
mod greedy;

/// Scores the legal actions of a state.
///
/// Implementations are shared across the worker threads of a [`BeamDecoder`] and must not
/// rely on mutable state between calls.
pub trait ActionScorer: Sync {
    /// Returns one score per entry of `actions`, in the same order.
    fn score(&self, state: &State, actions: &[Transition]) -> Result<Vec<f32>, Error>;
}

impl<F> ActionScorer for F
where
    F: Fn(&State, &[Transition]) -> Vec<f32> + Sync,
{
    fn score(&self, state: &State, actions: &[Transition]) -> Result<Vec<f32>, Error> {
        Ok(self(state, actions))
    }
}

/// A finished decoding run.
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
    pub tree: DependencyTree,
    pub actions: Vec<Transition>,
    pub score: f32,
}

impl Parse {
    pub(crate) fn from_state(state: &State, score: f32) -> Result<Self, Error> {
        use super::transition::TransitionState;

        let tree = state.to_tree()?;
        tree.validate()?;
        Ok(Parse {
            tree,
            actions: state.actions().to_vec(),
            score,
        })
    }
}

pub(crate) fn score_actions<A: ActionScorer + ?Sized>(
    scorer: &A,
    state: &State,
    actions: &[Transition],
) -> Result<Vec<f32>, Error> {
    let scores = scorer.score(state, actions)?;
    if scores.len() != actions.len() {
        return Err(Error::InputShape {
            expected: actions.len(),
            actual: scores.len(),
        });
    }
    if let Some(i) = scores.iter().position(|s| s.is_nan()) {
        return Err(Error::InvalidArgument(format!(
            "score of `{}` is NaN",
            actions[i]
        )));
    }
    Ok(scores)
}

pub(crate) fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}
