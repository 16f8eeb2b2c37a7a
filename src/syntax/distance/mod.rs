//! Tree construction from predicted structural distances and depths.
//!
//! A [`DistanceOracle`] predicts the tree distance between two tokens and the depth of a
//! token from their vectors. Builders only see the oracle through a [`DistanceCache`], which
//! is created for one sentence and asks the oracle at most once per unordered pair.

use std::collections::HashMap;

use ndarray::{ArrayView1, ArrayView2};

pub use self::mst::{minimum_spanning_tree, prim, MinimumSpanningTree};
pub use self::pointer::Pointer;
pub use self::spine::{LowerDistanceFirst, PendingElement, ShortDistanceFirst};

use super::{DependencyTree, Error, Index, ROOT};

mod mst;
mod pointer;
mod spine;

/// External predictor of pairwise distances and per-token depths.
pub trait DistanceOracle {
    /// Length of the token vectors the oracle accepts.
    fn dim(&self) -> usize;

    fn distance(&self, u: ArrayView1<f32>, v: ArrayView1<f32>) -> f32;

    fn depth(&self, u: ArrayView1<f32>) -> f32;
}

/// A decided attachment with its score (higher is better).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredArc {
    pub governor: Index,
    pub dependent: Index,
    pub score: f32,
}

impl ScoredArc {
    pub fn new(governor: Index, dependent: Index, score: f32) -> Self {
        ScoredArc {
            governor,
            dependent,
            score,
        }
    }
}

/// Strategy that turns distances and depths into arcs.
///
/// The returned arcs attach every token exactly once and contain exactly one arc from ROOT.
pub trait TreeBuilder {
    fn name(&self) -> &'static str;

    fn build(&self, cache: &mut DistanceCache) -> Result<Vec<ScoredArc>, Error>;
}

/// Memoized oracle lookups for one sentence, keyed by token ids.
pub struct DistanceCache<'a> {
    oracle: &'a dyn DistanceOracle,
    encodings: ArrayView2<'a, f32>,
    distances: HashMap<(Index, Index), f32>,
    depths: Vec<Option<f32>>,
    num_distance_calls: usize,
    num_depth_calls: usize,
}

impl<'a> DistanceCache<'a> {
    /// `encodings` holds one row per token.
    pub fn new(oracle: &'a dyn DistanceOracle, encodings: ArrayView2<'a, f32>) -> Result<Self, Error> {
        if encodings.ncols() != oracle.dim() {
            return Err(Error::InputShape {
                expected: oracle.dim(),
                actual: encodings.ncols(),
            });
        }
        Ok(DistanceCache {
            oracle,
            encodings,
            distances: HashMap::new(),
            depths: vec![None; encodings.nrows()],
            num_distance_calls: 0,
            num_depth_calls: 0,
        })
    }

    #[inline]
    pub fn num_tokens(&self) -> usize {
        self.encodings.nrows()
    }

    pub fn distance(&mut self, a: Index, b: Index) -> Result<f32, Error> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Ok(0.0);
        }
        let key = (a.min(b), a.max(b));
        if let Some(&distance) = self.distances.get(&key) {
            return Ok(distance);
        }
        let distance = self.oracle.distance(
            self.encodings.row(key.0 as usize),
            self.encodings.row(key.1 as usize),
        );
        self.num_distance_calls += 1;
        if distance.is_nan() {
            return Err(Error::InvalidArgument(format!(
                "distance between {} and {} is NaN",
                key.0, key.1
            )));
        }
        self.distances.insert(key, distance);
        Ok(distance)
    }

    pub fn depth(&mut self, a: Index) -> Result<f32, Error> {
        self.check_index(a)?;
        if let Some(depth) = self.depths[a as usize] {
            return Ok(depth);
        }
        let depth = self.oracle.depth(self.encodings.row(a as usize));
        self.num_depth_calls += 1;
        if depth.is_nan() {
            return Err(Error::InvalidArgument(format!("depth of {} is NaN", a)));
        }
        self.depths[a as usize] = Some(depth);
        Ok(depth)
    }

    /// The shallowest token; ties go to the smallest id.
    pub fn shallowest(&mut self) -> Result<Option<Index>, Error> {
        let mut best: Option<(Index, f32)> = None;
        for index in 0..self.num_tokens() as Index {
            let depth = self.depth(index)?;
            if best.map(|(_, best_depth)| depth < best_depth).unwrap_or(true) {
                best = Some((index, depth));
            }
        }
        Ok(best.map(|(index, _)| index))
    }

    pub fn num_distance_calls(&self) -> usize {
        self.num_distance_calls
    }

    pub fn num_depth_calls(&self) -> usize {
        self.num_depth_calls
    }

    fn check_index(&self, index: Index) -> Result<(), Error> {
        if (index as usize) < self.num_tokens() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "token {} is out of range for {} tokens",
                index,
                self.num_tokens()
            )))
        }
    }
}

/// Runs `builder` over one sentence and assembles the resulting tree.
pub fn decode<'a>(
    builder: &dyn TreeBuilder,
    oracle: &'a dyn DistanceOracle,
    encodings: ArrayView2<'a, f32>,
) -> Result<DependencyTree, Error> {
    let mut cache = DistanceCache::new(oracle, encodings)?;
    let arcs = builder.build(&mut cache)?;
    let tree = DependencyTree::from_arcs(
        cache.num_tokens(),
        arcs.iter().map(|arc| (arc.governor, arc.dependent, arc.score)),
    )?;
    tree.validate()?;
    Ok(tree)
}

pub(crate) fn root_arc(cache: &mut DistanceCache, root: Index) -> Result<ScoredArc, Error> {
    Ok(ScoredArc::new(ROOT, root, -cache.depth(root)?))
}
