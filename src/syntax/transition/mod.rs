use std::fmt;

pub use self::arc_eager::*;
pub use self::arc_standard::*;
pub use self::state::*;
pub use super::Error;

use super::{Index, Label};

mod arc_eager;
mod arc_standard;
pub mod prelude;
mod state;

/// Dense action id used to index model outputs.
pub type Action = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    Shift,
    Reduce,
    Root,
    LeftArc(Label),
    RightArc(Label),
}

impl Transition {
    pub fn from_action(action: Action) -> Self {
        match action {
            0 => Transition::Shift,
            1 => Transition::Reduce,
            2 => Transition::Root,
            _ => {
                let label = (action - 3) >> 1;
                if (action - 3) & 1 == 0 {
                    Transition::LeftArc(label)
                } else {
                    Transition::RightArc(label)
                }
            }
        }
    }

    pub fn into_action(self) -> Action {
        match self {
            Transition::Shift => 0,
            Transition::Reduce => 1,
            Transition::Root => 2,
            Transition::LeftArc(label) => 3 + (label << 1),
            Transition::RightArc(label) => 4 + (label << 1),
        }
    }

    pub fn label(&self) -> Option<Label> {
        match *self {
            Transition::LeftArc(label) | Transition::RightArc(label) => Some(label),
            _ => None,
        }
    }

    pub fn num_defined_actions(num_labels: usize) -> usize {
        3 + 2 * num_labels
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Transition::Shift => write!(f, "Shift"),
            Transition::Reduce => write!(f, "Reduce"),
            Transition::Root => write!(f, "Root"),
            Transition::LeftArc(label) => write!(f, "LeftArc({})", label),
            Transition::RightArc(label) => write!(f, "RightArc({})", label),
        }
    }
}

pub trait TransitionState {
    fn step(&self) -> usize {
        self.actions().len()
    }

    fn num_tokens(&self) -> usize;

    fn stack_top(&self) -> Option<Index>;

    /// `position` counts from the top of the stack.
    fn stack(&self, position: Index) -> Option<Index>;

    fn stack_size(&self) -> usize;

    fn is_stack_empty(&self) -> bool {
        self.stack_size() == 0
    }

    /// Number of stack items that have not been attached yet.
    fn num_unattached_on_stack(&self) -> usize {
        (0..self.stack_size() as Index)
            .filter_map(|position| self.stack(position))
            .filter(|&index| self.head(index).is_none())
            .count()
    }

    fn buffer_head(&self) -> Option<Index>;

    fn buffer(&self, position: Index) -> Option<Index>;

    fn buffer_size(&self) -> usize;

    fn is_buffer_empty(&self) -> bool {
        self.buffer_size() == 0
    }

    fn head(&self, index: Index) -> Option<Index>;

    fn heads(&self) -> &[Option<Index>];

    fn label(&self, index: Index) -> Option<Label>;

    fn labels(&self) -> &[Option<Label>];

    fn has_root(&self) -> bool {
        self.heads().iter().any(|&head| head == Some(super::ROOT))
    }

    fn leftmost(&self, index: Index, check_from: Option<Index>) -> Option<Index>;

    fn rightmost(&self, index: Index, check_from: Option<Index>) -> Option<Index>;

    fn actions(&self) -> &[Transition];
}

pub trait TransitionMutableState: TransitionState {
    fn advance(&mut self) -> Result<(), Error>;

    fn push(&mut self, index: Index) -> Result<(), Error>;

    fn pop(&mut self) -> Result<Index, Error>;

    fn add_arc(&mut self, index: Index, head: Index, label: Option<Label>) -> Result<(), Error>;

    fn record(&mut self, action: Transition) -> Result<(), Error>;
}

/// A set of transitions together with their preconditions.
///
/// Decoders are generic over the system and hold it by value, so systems carry only
/// configuration (the label inventory).
pub trait TransitionSystem: Send + Sync {
    fn name(&self) -> &'static str;

    fn num_labels(&self) -> usize;

    fn num_defined_actions(&self) -> usize {
        Transition::num_defined_actions(self.num_labels())
    }

    /// Number of actions from the initial to a terminal state, or an upper bound when the
    /// system does not have a fixed length.
    fn estimate_num_actions(&self, num_tokens: usize) -> usize;

    fn apply<S: TransitionMutableState>(&self, action: Transition, state: &mut S)
        -> Result<(), Error>;

    fn is_allowed<S: TransitionState>(&self, action: Transition, state: &S) -> bool;

    /// Legal actions in id order.
    fn legal_actions<S: TransitionState>(&self, state: &S) -> Vec<Transition> {
        (0..self.num_defined_actions() as Action)
            .map(Transition::from_action)
            .filter(|&action| self.is_allowed(action, state))
            .collect()
    }

    fn is_terminal<S: TransitionState>(&self, state: &S) -> bool;

    fn oracle<S: TransitionState>(
        &self,
        state: &S,
        gold_heads: &[Index],
        gold_labels: &[Label],
    ) -> Option<Transition>;
}

#[inline]
pub(crate) fn is_known_label(label: Label, num_labels: usize) -> bool {
    (label as usize) < num_labels
}

#[inline]
pub(crate) fn illegal<S: TransitionState>(action: Transition, state: &S) -> Error {
    Error::IllegalTransition {
        action,
        step: state.step(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_ids() {
        for action in 0..11 {
            assert_eq!(Transition::from_action(action).into_action(), action);
        }
        assert_eq!(Transition::from_action(3), Transition::LeftArc(0));
        assert_eq!(Transition::from_action(6), Transition::RightArc(1));
        assert_eq!(Transition::num_defined_actions(4), 11);
    }
}
