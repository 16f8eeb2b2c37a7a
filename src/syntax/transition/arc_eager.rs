use super::{
    illegal, is_known_label, Error, Transition, TransitionMutableState, TransitionState,
    TransitionSystem,
};
use crate::syntax::{Index, Label, ROOT};

/// Arc-eager system whose stack holds the right spine of the partial forest.
///
/// There is no pseudo root token. Instead `Root` attaches the only unattached stack item
/// to ROOT once the buffer is exhausted, and the preconditions of `Shift` and `RightArc`
/// keep that item unique. A sentence of `n` tokens takes between `n + 1` and `2n` actions.
#[derive(Debug, Clone)]
pub struct ArcEager {
    num_labels: usize,
}

impl ArcEager {
    pub fn new(num_labels: usize) -> Self {
        ArcEager { num_labels }
    }

    /// Shift: (s, i|b, A) => (s|i, b, A)
    pub fn apply_shift<S: TransitionMutableState>(state: &mut S) -> Result<(), Error> {
        let b0 = state
            .buffer_head()
            .ok_or(Error::InvalidOperation("shift on an empty buffer"))?;
        state.push(b0)?;
        state.advance()
    }

    /// Left Arc: (s|i, j|b, A) => (s, j|b, A +(j,l,i))
    pub fn apply_left_arc<S: TransitionMutableState>(
        state: &mut S,
        label: Label,
    ) -> Result<(), Error> {
        let b0 = state
            .buffer_head()
            .ok_or(Error::InvalidOperation("left arc on an empty buffer"))?;
        let s0 = state.pop()?;
        state.add_arc(s0, b0, Some(label))
    }

    /// Right Arc: (s|i, j|b, A) => (s|i|j, b, A +(i,l,j))
    pub fn apply_right_arc<S: TransitionMutableState>(
        state: &mut S,
        label: Label,
    ) -> Result<(), Error> {
        let b0 = state
            .buffer_head()
            .ok_or(Error::InvalidOperation("right arc on an empty buffer"))?;
        let s0 = state
            .stack_top()
            .ok_or(Error::InvalidOperation("right arc on an empty stack"))?;
        state.add_arc(b0, s0, Some(label))?;
        state.push(b0)?;
        state.advance()
    }

    /// Reduce: (s|i, b, A) => (s, b, A)
    pub fn apply_reduce<S: TransitionMutableState>(state: &mut S) -> Result<(), Error> {
        state.pop().map(|_| ())
    }

    /// Root: (s, [], A) => ([], [], A +(ROOT,r)) where r is the unattached item of s
    pub fn apply_root<S: TransitionMutableState>(state: &mut S) -> Result<(), Error> {
        let mut root = None;
        while !state.is_stack_empty() {
            let index = state.pop()?;
            if state.head(index).is_none() {
                root = Some(index);
            }
        }
        let root = root.ok_or(Error::InvalidOperation("no unattached token on the stack"))?;
        state.add_arc(root, ROOT, None)
    }

    pub fn is_allowed_shift<S: TransitionState>(state: &S) -> bool {
        // shifting the last token onto an unattached item would leave two roots
        match state.buffer_size() {
            0 => false,
            1 => state.is_stack_empty(),
            _ => true,
        }
    }

    pub fn is_allowed_left_arc<S: TransitionState>(state: &S) -> bool {
        !state.is_buffer_empty()
            && state
                .stack_top()
                .map(|s0| state.head(s0).is_none())
                .unwrap_or(false)
    }

    pub fn is_allowed_right_arc<S: TransitionState>(state: &S) -> bool {
        match state.buffer_size() {
            0 => false,
            1 => !state.is_stack_empty() && state.num_unattached_on_stack() == 1,
            _ => !state.is_stack_empty(),
        }
    }

    pub fn is_allowed_reduce<S: TransitionState>(state: &S) -> bool {
        state
            .stack_top()
            .map(|s0| state.head(s0).is_some())
            .unwrap_or(false)
    }

    pub fn is_allowed_root<S: TransitionState>(state: &S) -> bool {
        state.is_buffer_empty()
            && !state.is_stack_empty()
            && state.num_unattached_on_stack() == 1
    }

    fn has_relation_below_top<S: TransitionState>(
        state: &S,
        gold_heads: &[Index],
        b0: Index,
    ) -> bool {
        (1..state.stack_size() as Index)
            .filter_map(|position| state.stack(position))
            .any(|k| gold_heads[k as usize] == b0 || gold_heads[b0 as usize] == k)
    }
}

impl TransitionSystem for ArcEager {
    fn name(&self) -> &'static str {
        "arc-eager"
    }

    fn num_labels(&self) -> usize {
        self.num_labels
    }

    fn estimate_num_actions(&self, num_tokens: usize) -> usize {
        2 * num_tokens
    }

    fn apply<S: TransitionMutableState>(
        &self,
        action: Transition,
        state: &mut S,
    ) -> Result<(), Error> {
        if !self.is_allowed(action, state) {
            return Err(illegal(action, state));
        }
        match action {
            Transition::Shift => ArcEager::apply_shift(state)?,
            Transition::LeftArc(label) => ArcEager::apply_left_arc(state, label)?,
            Transition::RightArc(label) => ArcEager::apply_right_arc(state, label)?,
            Transition::Reduce => ArcEager::apply_reduce(state)?,
            Transition::Root => ArcEager::apply_root(state)?,
        }
        state.record(action)
    }

    fn is_allowed<S: TransitionState>(&self, action: Transition, state: &S) -> bool {
        match action {
            Transition::Shift => ArcEager::is_allowed_shift(state),
            Transition::LeftArc(label) => {
                is_known_label(label, self.num_labels) && ArcEager::is_allowed_left_arc(state)
            }
            Transition::RightArc(label) => {
                is_known_label(label, self.num_labels) && ArcEager::is_allowed_right_arc(state)
            }
            Transition::Reduce => ArcEager::is_allowed_reduce(state),
            Transition::Root => ArcEager::is_allowed_root(state),
        }
    }

    fn is_terminal<S: TransitionState>(&self, state: &S) -> bool {
        state.is_buffer_empty() && state.is_stack_empty()
    }

    fn oracle<S: TransitionState>(
        &self,
        state: &S,
        gold_heads: &[Index],
        gold_labels: &[Label],
    ) -> Option<Transition> {
        let b0 = match state.buffer_head() {
            Some(b0) => b0,
            None if !state.is_stack_empty() => return Some(Transition::Root),
            None => return None,
        };
        if let Some(s0) = state.stack_top() {
            if gold_heads[s0 as usize] == b0 {
                return Some(Transition::LeftArc(gold_labels[s0 as usize]));
            } else if gold_heads[b0 as usize] == s0 {
                return Some(Transition::RightArc(gold_labels[b0 as usize]));
            } else if state.head(s0).is_some()
                && ArcEager::has_relation_below_top(state, gold_heads, b0)
            {
                return Some(Transition::Reduce);
            }
        }
        Some(Transition::Shift)
    }
}
