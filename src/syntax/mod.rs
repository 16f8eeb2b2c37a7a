use std::u32::MAX as U32_MAX;

pub use self::tree::DependencyTree;

pub mod decode;
pub mod distance;
pub mod graph;
pub mod transition;
mod tree;

/// Token position within a sentence (0-based).
pub type Index = u32;
/// Opaque dependency label id.
pub type Label = u32;

/// Governor id that stands for "no governor" (the top of the tree).
pub const ROOT: Index = U32_MAX;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("illegal transition `{action}` at step {step}")]
    IllegalTransition {
        action: transition::Transition,
        step: usize,
    },
    #[error("no score for dependent {dependent} (governor: {governor:?})")]
    Lookup {
        dependent: Index,
        governor: Option<Index>,
    },
    #[error("unresolvable cycle over tokens {0:?}")]
    UnresolvableCycle(Vec<Index>),
    #[error("input shape mismatch: expected {expected}, got {actual}")]
    InputShape { expected: usize, actual: usize },
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no terminal hypothesis after {steps} steps")]
    SearchExhausted { steps: usize },
    #[error("decoder has been closed")]
    Closed,
}

/// Projectivizes a dependency tree
///
/// `heads` uses [`ROOT`] for the top token. The deepest non-projective arc is lifted to its
/// grandparent until no crossing arcs remain.
///
/// References:
/// - https://github.com/tensorflow/models/blob/7d30a017fe50b648be6dee544f8059bde52db562/syntaxnet/syntaxnet/document_filters.cc#L296
pub fn projectivize(heads: &[Index]) -> Result<Vec<Index>, Error> {
    DependencyTree::from_heads(heads)?.validate()?;

    // position 0 is a pseudo root so that every arc has a finite span.
    let mut heads: Vec<i64> = Some(0)
        .into_iter()
        .chain(heads.iter().map(|&head| if head == ROOT { 0 } else { head as i64 + 1 }))
        .collect();
    let num_tokens = heads.len();
    let mut left: Vec<i64> = vec![-1; num_tokens];
    let mut right: Vec<i64> = vec![-1; num_tokens];
    loop {
        for i in 0..num_tokens {
            left[i] = -1;
            right[i] = num_tokens as i64;
        }

        for (i, head) in heads.iter().enumerate().skip(1) {
            let l = (i as i64).min(*head);
            let r = (i as i64).max(*head);
            for j in (l + 1)..r {
                let j = j as usize;
                if left[j] < l {
                    left[j] = l;
                }
                if right[j] > r {
                    right[j] = r;
                }
            }
        }

        let mut deepest_arc = None;
        let mut max_depth = 0;
        for (i, head) in heads.iter().enumerate().skip(1) {
            if *head == 0 {
                continue;
            }
            let l = (i as i64).min(*head);
            let r = (i as i64).max(*head);
            let left_bound = left[l as usize].max(left[r as usize]);
            let right_bound = right[l as usize].min(right[r as usize]);

            if l < left_bound || r > right_bound {
                let mut depth = 0;
                let mut j = i;
                while j != 0 {
                    depth += 1;
                    j = heads[j] as usize;
                }
                if depth > max_depth {
                    deepest_arc = Some(i);
                    max_depth = depth;
                }
            }
        }

        match deepest_arc {
            Some(arc) => {
                let lifted_head = heads[heads[arc] as usize];
                heads[arc] = lifted_head;
            }
            None => {
                return Ok(heads
                    .iter()
                    .skip(1)
                    .map(|&head| if head == 0 { ROOT } else { (head - 1) as Index })
                    .collect());
            }
        }
    }
}
