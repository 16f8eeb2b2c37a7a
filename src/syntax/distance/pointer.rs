use std::collections::{BTreeSet, VecDeque};

use ordered_float::OrderedFloat;
use slog::Logger;

use super::{root_arc, DistanceCache, ScoredArc, TreeBuilder};
use crate::syntax::decode::discard_logger;
use crate::syntax::{Error, Index};

/// Grows the tree top-down from the shallowest token.
///
/// Every attached token takes as dependents all pending tokens at rounded distance 1 from it.
/// When no attached token has such a neighbour left, the closest pending/attached pair by raw
/// distance is joined and expansion resumes from the new token.
#[derive(Debug)]
pub struct Pointer {
    logger: Logger,
}

impl Default for Pointer {
    fn default() -> Self {
        Pointer::new()
    }
}

/// Distance rounded to the nearest integer, but never below 1.
#[inline]
fn rounded_distance(distance: f32) -> f32 {
    distance.round().max(1.0)
}

impl Pointer {
    pub fn new() -> Self {
        Pointer {
            logger: discard_logger(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Pending tokens directly below `governor`, nearest first.
    fn direct_dependents(
        governor: Index,
        pending: &BTreeSet<Index>,
        cache: &mut DistanceCache,
    ) -> Result<Vec<(Index, f32)>, Error> {
        let mut dependents = Vec::new();
        for &dependent in pending {
            let distance = cache.distance(governor, dependent)?;
            if rounded_distance(distance) == 1.0 {
                dependents.push((dependent, distance));
            }
        }
        // stable, so equal distances stay in id order
        dependents.sort_by_key(|&(_, distance)| OrderedFloat(distance));
        Ok(dependents)
    }

    /// The closest (attached, pending) pair; ties go to the smallest pending id, then the
    /// smallest attached id.
    fn nearest_pair(
        attached: &BTreeSet<Index>,
        pending: &BTreeSet<Index>,
        cache: &mut DistanceCache,
    ) -> Result<Option<(Index, Index, f32)>, Error> {
        let mut best: Option<(Index, Index, f32)> = None;
        for &dependent in pending {
            for &governor in attached {
                let distance = cache.distance(governor, dependent)?;
                if best.map(|(_, _, d)| distance < d).unwrap_or(true) {
                    best = Some((governor, dependent, distance));
                }
            }
        }
        Ok(best)
    }
}

impl TreeBuilder for Pointer {
    fn name(&self) -> &'static str {
        "pointer"
    }

    fn build(&self, cache: &mut DistanceCache) -> Result<Vec<ScoredArc>, Error> {
        let root = match cache.shallowest()? {
            Some(root) => root,
            None => return Ok(Vec::new()),
        };
        let mut arcs = Vec::with_capacity(cache.num_tokens());
        arcs.push(root_arc(cache, root)?);
        let mut pending: BTreeSet<Index> = (0..cache.num_tokens() as Index)
            .filter(|&index| index != root)
            .collect();
        let mut attached: BTreeSet<Index> = Some(root).into_iter().collect();
        let mut frontier: VecDeque<Index> = Some(root).into_iter().collect();

        loop {
            while let Some(governor) = frontier.pop_front() {
                for (dependent, distance) in Pointer::direct_dependents(governor, &pending, cache)? {
                    pending.remove(&dependent);
                    attached.insert(dependent);
                    frontier.push_back(dependent);
                    arcs.push(ScoredArc::new(governor, dependent, -distance));
                    trace!(self.logger, "attach {} -> {} (direct)", governor, dependent);
                }
            }
            match Pointer::nearest_pair(&attached, &pending, cache)? {
                Some((governor, dependent, distance)) => {
                    pending.remove(&dependent);
                    attached.insert(dependent);
                    frontier.push_back(dependent);
                    arcs.push(ScoredArc::new(governor, dependent, -distance));
                    trace!(self.logger, "attach {} -> {} (nearest)", governor, dependent);
                }
                None => break,
            }
        }
        Ok(arcs)
    }
}

#[cfg(test)]
mod tests {
    use super::rounded_distance;

    #[test]
    fn test_rounded_distance() {
        assert_eq!(rounded_distance(0.2), 1.0);
        assert_eq!(rounded_distance(1.4), 1.0);
        assert_eq!(rounded_distance(1.6), 2.0);
        assert_eq!(rounded_distance(3.0), 3.0);
    }
}
