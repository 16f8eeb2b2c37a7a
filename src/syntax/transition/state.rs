use std::ops::Deref;
use std::u32::MAX as U32_MAX;

use super::{illegal, Error, Transition, TransitionMutableState, TransitionState, TransitionSystem};
use crate::syntax::{DependencyTree, Index, Label, ROOT};

#[inline]
fn default_capacity(num_tokens: usize) -> usize {
    2 * num_tokens
}

/// Stack/buffer configuration shared by all transition systems.
///
/// The buffer is a contiguous suffix of the sentence, so only its front is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    num_tokens: Index,
    stack: Vec<Index>,
    buffer: Option<Index>,
    heads: Vec<Option<Index>>,
    labels: Vec<Option<Label>>,
    actions: Vec<Transition>,
}

impl State {
    pub fn new(num_tokens: u32) -> Self {
        State::with_capacity(num_tokens, default_capacity(num_tokens as usize))
    }

    pub fn with_capacity(num_tokens: u32, capacity: usize) -> Self {
        let n = num_tokens as usize;
        State {
            num_tokens,
            stack: Vec::with_capacity(n),
            buffer: if num_tokens > 0 { Some(0) } else { None },
            heads: vec![None; n],
            labels: vec![None; n],
            actions: Vec::with_capacity(capacity),
        }
    }

    pub fn to_tree(&self) -> Result<DependencyTree, Error> {
        let mut tree = DependencyTree::new(self.num_tokens as usize);
        for (index, (head, label)) in self.heads.iter().zip(&self.labels).enumerate() {
            if let Some(head) = *head {
                tree.set_arc(index as Index, head, *label, None)?;
            }
        }
        Ok(tree)
    }
}

impl TransitionState for State {
    fn step(&self) -> usize {
        self.actions.len()
    }

    fn num_tokens(&self) -> usize {
        self.num_tokens as usize
    }

    fn stack_top(&self) -> Option<Index> {
        self.stack.last().cloned()
    }

    fn stack(&self, position: Index) -> Option<Index> {
        let position = position as usize;
        let stack_size = self.stack.len();
        if position < stack_size {
            self.stack.get(stack_size - 1 - position).cloned()
        } else {
            None
        }
    }

    fn stack_size(&self) -> usize {
        self.stack.len()
    }

    fn is_stack_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn num_unattached_on_stack(&self) -> usize {
        self.stack
            .iter()
            .filter(|&&index| self.heads[index as usize].is_none())
            .count()
    }

    fn buffer_head(&self) -> Option<Index> {
        self.buffer
    }

    fn buffer(&self, position: Index) -> Option<Index> {
        if let Some(buffer) = self.buffer {
            let index = buffer + position;
            if index < self.num_tokens {
                return Some(index);
            }
        }
        None
    }

    fn buffer_size(&self) -> usize {
        match self.buffer {
            Some(buffer) => (self.num_tokens - buffer) as usize,
            None => 0,
        }
    }

    fn is_buffer_empty(&self) -> bool {
        self.buffer.is_none()
    }

    fn head(&self, index: Index) -> Option<Index> {
        if index < self.num_tokens {
            return self.heads[index as usize];
        }
        None
    }

    fn heads(&self) -> &[Option<Index>] {
        &self.heads
    }

    fn label(&self, index: Index) -> Option<Label> {
        if index < self.num_tokens {
            return self.labels[index as usize];
        }
        None
    }

    fn labels(&self) -> &[Option<Label>] {
        &self.labels
    }

    fn leftmost(&self, index: Index, check_from: Option<Index>) -> Option<Index> {
        if index < self.num_tokens {
            let check_from = check_from.unwrap_or(0);
            if check_from < index {
                let expected = Some(index);
                for i in check_from..index {
                    if self.heads[i as usize] == expected {
                        return Some(i);
                    }
                }
            }
        }
        None
    }

    fn rightmost(&self, index: Index, check_from: Option<Index>) -> Option<Index> {
        if index < self.num_tokens {
            let check_from = match check_from {
                Some(val) => (val + 1).min(self.num_tokens),
                None => self.num_tokens,
            };
            if check_from > index {
                let expected = Some(index);
                for i in (index + 1..check_from).rev() {
                    if self.heads[i as usize] == expected {
                        return Some(i);
                    }
                }
            }
        }
        None
    }

    fn actions(&self) -> &[Transition] {
        &self.actions
    }
}

impl TransitionMutableState for State {
    fn advance(&mut self) -> Result<(), Error> {
        match self.buffer {
            Some(buffer) => {
                if buffer == self.num_tokens - 1 {
                    self.buffer = None;
                } else {
                    self.buffer = Some(buffer + 1);
                }
                Ok(())
            }
            None => Err(Error::InvalidOperation("advance on an empty buffer")),
        }
    }

    fn push(&mut self, index: Index) -> Result<(), Error> {
        self.stack.push(index);
        Ok(())
    }

    fn pop(&mut self) -> Result<Index, Error> {
        self.stack
            .pop()
            .ok_or(Error::InvalidOperation("pop from an empty stack"))
    }

    fn add_arc(&mut self, index: Index, head: Index, label: Option<Label>) -> Result<(), Error> {
        if index >= self.num_tokens {
            Err(Error::InvalidOperation("dependent out of range"))
        } else if head != ROOT && head >= self.num_tokens {
            Err(Error::InvalidOperation("head out of range"))
        } else if index == head {
            Err(Error::InvalidOperation("self loop"))
        } else {
            let val = &mut self.heads[index as usize];
            match *val {
                Some(_) => Err(Error::InvalidOperation("token already has a head")),
                None => {
                    *val = Some(head);
                    self.labels[index as usize] = label;
                    Ok(())
                }
            }
        }
    }

    fn record(&mut self, action: Transition) -> Result<(), Error> {
        self.actions.push(action);
        Ok(())
    }
}

/// Terminal state reached by replaying a system's static oracle on a gold tree.
#[derive(Debug)]
pub struct GoldState {
    internal: State,
}

impl GoldState {
    pub fn new<T: TransitionSystem>(
        system: &T,
        heads: &[Index],
        labels: &[Label],
    ) -> Result<Self, Error> {
        GoldState::with_feature_extract(system, heads, labels, |_| ()).map(|(state, _)| state)
    }

    /// Replays the oracle and collects `extract(state)` before every action.
    pub fn with_feature_extract<T: TransitionSystem, FO, F: FnMut(&State) -> FO>(
        system: &T,
        heads: &[Index],
        labels: &[Label],
        mut extract: F,
    ) -> Result<(Self, Vec<FO>), Error> {
        let n = heads.len();
        if n >= (U32_MAX as usize) {
            return Err(Error::InvalidArgument(format!("too many tokens: {}", n)));
        } else if n != labels.len() {
            return Err(Error::InvalidArgument(format!(
                "{} heads but {} labels",
                n,
                labels.len()
            )));
        }
        let capacity = system.estimate_num_actions(n);
        let mut internal = State::with_capacity(n as u32, capacity);
        let mut features = Vec::with_capacity(capacity);
        while !system.is_terminal(&internal) {
            if internal.step() >= capacity {
                return Err(Error::SearchExhausted {
                    steps: internal.step(),
                });
            }
            features.push(extract(&internal));
            let action = system
                .oracle(&internal, heads, labels)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "gold tree is not reachable by {}",
                        system.name()
                    ))
                })?;
            if !system.is_allowed(action, &internal) {
                return Err(illegal(action, &internal));
            }
            system.apply(action, &mut internal)?;
        }
        Ok((GoldState { internal }, features))
    }

    pub fn into_inner(self) -> State {
        self.internal
    }
}

impl Deref for GoldState {
    type Target = State;

    fn deref(&self) -> &State {
        &self.internal
    }
}
