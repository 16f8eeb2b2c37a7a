use super::{
    illegal, is_known_label, Error, Transition, TransitionMutableState, TransitionState,
    TransitionSystem,
};
use crate::syntax::{Index, Label, ROOT};

/// Arc-standard system with an explicit `Root` transition.
///
/// A sentence of `n` tokens is parsed with `n` shifts, `n - 1` arcs and one `Root`.
#[derive(Debug, Clone)]
pub struct ArcStandard {
    num_labels: usize,
}

impl ArcStandard {
    pub fn new(num_labels: usize) -> Self {
        ArcStandard { num_labels }
    }

    /// Shift: (s, i|b, A) => (s|i, b, A)
    pub fn apply_shift<S: TransitionMutableState>(state: &mut S) -> Result<(), Error> {
        match state.buffer_head() {
            Some(b0) => {
                state.push(b0)?;
                state.advance()
            }
            None => Err(Error::InvalidOperation("shift on an empty buffer")),
        }
    }

    /// Left Arc: (s|i|j, b, A) => (s|j, b, A +(j,l,i))
    pub fn apply_left_arc<S: TransitionMutableState>(
        state: &mut S,
        label: Label,
    ) -> Result<(), Error> {
        let s0 = state.pop()?;
        let s1 = state.pop()?;
        state.add_arc(s1, s0, Some(label))?;
        state.push(s0)
    }

    /// Right Arc: (s|i|j, b, A) => (s|i, b, A +(i,l,j))
    pub fn apply_right_arc<S: TransitionMutableState>(
        state: &mut S,
        label: Label,
    ) -> Result<(), Error> {
        let s0 = state.pop()?;
        let s1 = state
            .stack_top()
            .ok_or(Error::InvalidOperation("right arc needs two stack items"))?;
        state.add_arc(s0, s1, Some(label))
    }

    /// Root: (i, [], A) => ([], [], A +(ROOT,i))
    pub fn apply_root<S: TransitionMutableState>(state: &mut S) -> Result<(), Error> {
        let s0 = state.pop()?;
        state.add_arc(s0, ROOT, None)
    }

    pub fn is_allowed_shift<S: TransitionState>(state: &S) -> bool {
        !state.is_buffer_empty()
    }

    pub fn is_allowed_left_arc<S: TransitionState>(state: &S) -> bool {
        state.stack_size() >= 2
    }

    pub fn is_allowed_right_arc<S: TransitionState>(state: &S) -> bool {
        state.stack_size() >= 2
    }

    pub fn is_allowed_root<S: TransitionState>(state: &S) -> bool {
        state.is_buffer_empty() && state.stack_size() == 1
    }

    pub fn done_children_right_of<S: TransitionState>(
        state: &S,
        gold_heads: &[Index],
        head: Index,
    ) -> bool {
        if let Some(mut index) = state.buffer_head() {
            let num_tokens = state.num_tokens() as u32;
            while index < num_tokens {
                let actual_head = gold_heads[index as usize];
                if actual_head == head {
                    return false;
                }
                index = if actual_head > index {
                    actual_head
                } else {
                    index + 1
                };
            }
        }
        true
    }
}

impl TransitionSystem for ArcStandard {
    fn name(&self) -> &'static str {
        "arc-standard"
    }

    fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Exactly `2 * num_tokens`: the final `Root` pops the last stack item, so a parse takes
    /// one action more than arc-standard variants that stop with the root left on the stack.
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
            Transition::Shift => ArcStandard::apply_shift(state)?,
            Transition::LeftArc(label) => ArcStandard::apply_left_arc(state, label)?,
            Transition::RightArc(label) => ArcStandard::apply_right_arc(state, label)?,
            Transition::Root => ArcStandard::apply_root(state)?,
            Transition::Reduce => return Err(illegal(action, state)),
        }
        state.record(action)
    }

    fn is_allowed<S: TransitionState>(&self, action: Transition, state: &S) -> bool {
        match action {
            Transition::Shift => ArcStandard::is_allowed_shift(state),
            Transition::LeftArc(label) => {
                is_known_label(label, self.num_labels) && ArcStandard::is_allowed_left_arc(state)
            }
            Transition::RightArc(label) => {
                is_known_label(label, self.num_labels) && ArcStandard::is_allowed_right_arc(state)
            }
            Transition::Root => ArcStandard::is_allowed_root(state),
            Transition::Reduce => false,
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
        if state.stack_size() >= 2 {
            let s0 = state.stack_top()?;
            let s1 = state.stack(1)?;
            if gold_heads[s0 as usize] == s1
                && ArcStandard::done_children_right_of(state, gold_heads, s0)
            {
                Some(Transition::RightArc(gold_labels[s0 as usize]))
            } else if gold_heads[s1 as usize] == s0 {
                Some(Transition::LeftArc(gold_labels[s1 as usize]))
            } else if !state.is_buffer_empty() {
                Some(Transition::Shift)
            } else {
                None
            }
        } else if !state.is_buffer_empty() {
            Some(Transition::Shift)
        } else if state.stack_size() == 1 {
            let s0 = state.stack_top()?;
            if gold_heads[s0 as usize] == ROOT {
                Some(Transition::Root)
            } else {
                None
            }
        } else {
            None
        }
    }
}
