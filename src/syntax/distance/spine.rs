use slog::Logger;

use super::{root_arc, DistanceCache, ScoredArc, TreeBuilder};
use crate::syntax::decode::discard_logger;
use crate::syntax::{Error, Index};

/// A subtree that has not been attached yet.
///
/// The spines list the top token followed by its leftmost (rightmost) dependent, that
/// dependent's leftmost (rightmost) dependent, and so on: the nodes a neighbouring subtree
/// can still attach to without crossing arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingElement {
    id: Index,
    depth: f32,
    left_spine: Vec<Index>,
    right_spine: Vec<Index>,
}

impl PendingElement {
    pub fn new(id: Index, depth: f32) -> Self {
        PendingElement {
            id,
            depth,
            left_spine: vec![id],
            right_spine: vec![id],
        }
    }

    pub fn id(&self) -> Index {
        self.id
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn left_spine(&self) -> &[Index] {
        &self.left_spine
    }

    pub fn right_spine(&self) -> &[Index] {
        &self.right_spine
    }

    /// Attaches `dependent`, which lies to the right, under `right_spine[position]`.
    /// Returns the governor.
    pub fn attach_right(&mut self, dependent: PendingElement, position: usize) -> Index {
        let governor = self.right_spine[position];
        self.right_spine.truncate(position + 1);
        self.right_spine.extend(dependent.right_spine);
        governor
    }

    /// Attaches `dependent`, which lies to the left, under `left_spine[position]`.
    /// Returns the governor.
    pub fn attach_left(&mut self, dependent: PendingElement, position: usize) -> Index {
        let governor = self.left_spine[position];
        self.left_spine.truncate(position + 1);
        self.left_spine.extend(dependent.left_spine);
        governor
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    /// the right element goes under the left element's right spine
    Right,
    /// the left element goes under the right element's left spine
    Left,
}

fn init_pending(cache: &mut DistanceCache) -> Result<Vec<PendingElement>, Error> {
    (0..cache.num_tokens() as Index)
        .map(|id| Ok(PendingElement::new(id, cache.depth(id)?)))
        .collect()
}

/// Lowest spine position that is still shallower than `depth`.
fn attachment_point(spine: &[Index], depth: f32, cache: &mut DistanceCache) -> Result<usize, Error> {
    let mut position = 0;
    while position + 1 < spine.len() && cache.depth(spine[position + 1])? < depth {
        position += 1;
    }
    Ok(position)
}

/// Attaches `pending[i + 1]` below `pending[i]` or the reverse and records the arc.
fn merge(
    pending: &mut Vec<PendingElement>,
    i: usize,
    side: Side,
    position: usize,
    cache: &mut DistanceCache,
) -> Result<ScoredArc, Error> {
    let (governor, dependent) = match side {
        Side::Right => {
            let dependent = pending.remove(i + 1);
            let id = dependent.id;
            (pending[i].attach_right(dependent, position), id)
        }
        Side::Left => {
            let dependent = pending.remove(i);
            let id = dependent.id;
            (pending[i].attach_left(dependent, position), id)
        }
    };
    Ok(ScoredArc::new(
        governor,
        dependent,
        -cache.distance(governor, dependent)?,
    ))
}

/// Repeatedly merges the closest pair of neighbouring subtrees.
///
/// The shallower top governs; the deeper one hangs from the lowest node of the facing spine
/// that is still shallower than it.
#[derive(Debug)]
pub struct LowerDistanceFirst {
    logger: Logger,
}

impl Default for LowerDistanceFirst {
    fn default() -> Self {
        LowerDistanceFirst::new()
    }
}

impl LowerDistanceFirst {
    pub fn new() -> Self {
        LowerDistanceFirst {
            logger: discard_logger(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

impl TreeBuilder for LowerDistanceFirst {
    fn name(&self) -> &'static str {
        "lower-distance-first"
    }

    fn build(&self, cache: &mut DistanceCache) -> Result<Vec<ScoredArc>, Error> {
        let mut pending = init_pending(cache)?;
        let mut arcs = Vec::with_capacity(pending.len());
        while pending.len() > 1 {
            let mut best: Option<(usize, f32)> = None;
            for i in 0..pending.len() - 1 {
                let distance = cache.distance(pending[i].id, pending[i + 1].id)?;
                if best.map(|(_, d)| distance < d).unwrap_or(true) {
                    best = Some((i, distance));
                }
            }
            let i = match best {
                Some((i, _)) => i,
                None => break,
            };
            let (side, position) = if pending[i].depth <= pending[i + 1].depth {
                let position =
                    attachment_point(&pending[i].right_spine, pending[i + 1].depth, cache)?;
                (Side::Right, position)
            } else {
                let position =
                    attachment_point(&pending[i + 1].left_spine, pending[i].depth, cache)?;
                (Side::Left, position)
            };
            let arc = merge(&mut pending, i, side, position, cache)?;
            trace!(self.logger, "attach {} -> {}", arc.governor, arc.dependent);
            arcs.push(arc);
        }
        if let Some(root) = pending.first() {
            arcs.push(root_arc(cache, root.id)?);
        }
        Ok(arcs)
    }
}

/// Merges neighbouring subtrees at the globally closest spine attachment.
///
/// For every neighbouring pair, each node on the facing spine that is not deeper than the
/// other subtree's top is a candidate governor. The candidate with the smallest distance to
/// the dependent top wins; ties go to the leftmost pair and the spine node nearest its top.
#[derive(Debug)]
pub struct ShortDistanceFirst {
    logger: Logger,
}

impl Default for ShortDistanceFirst {
    fn default() -> Self {
        ShortDistanceFirst::new()
    }
}

impl ShortDistanceFirst {
    pub fn new() -> Self {
        ShortDistanceFirst {
            logger: discard_logger(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

impl TreeBuilder for ShortDistanceFirst {
    fn name(&self) -> &'static str {
        "short-distance-first"
    }

    fn build(&self, cache: &mut DistanceCache) -> Result<Vec<ScoredArc>, Error> {
        let mut pending = init_pending(cache)?;
        let mut arcs = Vec::with_capacity(pending.len());
        while pending.len() > 1 {
            // (distance, pair, side, spine position)
            let mut best: Option<(f32, usize, Side, usize)> = None;
            for i in 0..pending.len() - 1 {
                let (left, right) = (&pending[i], &pending[i + 1]);
                let candidates = left
                    .right_spine
                    .iter()
                    .enumerate()
                    .map(|(p, &x)| (Side::Right, p, x, right.id, right.depth))
                    .chain(
                        right
                            .left_spine
                            .iter()
                            .enumerate()
                            .map(|(p, &x)| (Side::Left, p, x, left.id, left.depth)),
                    )
                    .collect::<Vec<_>>();
                for (side, position, governor, dependent, dependent_depth) in candidates {
                    if cache.depth(governor)? > dependent_depth {
                        continue;
                    }
                    let distance = cache.distance(governor, dependent)?;
                    if best.map(|(d, _, _, _)| distance < d).unwrap_or(true) {
                        best = Some((distance, i, side, position));
                    }
                }
            }
            let (_, i, side, position) =
                best.ok_or(Error::InvalidOperation("no admissible attachment"))?;
            let arc = merge(&mut pending, i, side, position, cache)?;
            trace!(self.logger, "attach {} -> {}", arc.governor, arc.dependent);
            arcs.push(arc);
        }
        if let Some(root) = pending.first() {
            arcs.push(root_arc(cache, root.id)?);
        }
        Ok(arcs)
    }
}
