use std::collections::VecDeque;
use std::f32::INFINITY as F32_INFINITY;

use ndarray::ArrayView2;
use slog::Logger;

use super::{root_arc, DistanceCache, ScoredArc, TreeBuilder};
use crate::syntax::decode::discard_logger;
use crate::syntax::{Error, Index};

/// Minimum spanning tree of a complete undirected graph by Prim's algorithm.
///
/// Starts from node 0 and repeatedly adds the cheapest edge leaving the tree. `weight` is
/// called once for every edge `(u, v)` with `u` already in the tree. Returns `(u, v, weight)`
/// edges in the order they were added; ties go to the smallest node id.
pub fn prim<F>(num_nodes: usize, mut weight: F) -> Result<Vec<(Index, Index, f32)>, Error>
where
    F: FnMut(Index, Index) -> Result<f32, Error>,
{
    if num_nodes == 0 {
        return Ok(Vec::new());
    }
    let mut in_tree = vec![false; num_nodes];
    let mut min_cost = vec![F32_INFINITY; num_nodes];
    let mut parent: Vec<Index> = vec![0; num_nodes];
    in_tree[0] = true;
    for v in 1..num_nodes {
        min_cost[v] = weight(0, v as Index)?;
    }

    let mut edges = Vec::with_capacity(num_nodes - 1);
    for _ in 1..num_nodes {
        let mut next: Option<usize> = None;
        for v in 0..num_nodes {
            if !in_tree[v] && next.map(|u| min_cost[v] < min_cost[u]).unwrap_or(true) {
                next = Some(v);
            }
        }
        let v = match next {
            Some(v) => v,
            None => break,
        };
        in_tree[v] = true;
        edges.push((parent[v], v as Index, min_cost[v]));
        for w in 0..num_nodes {
            if in_tree[w] {
                continue;
            }
            let cost = weight(v as Index, w as Index)?;
            if cost < min_cost[w] {
                min_cost[w] = cost;
                parent[w] = v as Index;
            }
        }
    }
    Ok(edges)
}

/// [`prim`] over a square weight matrix.
pub fn minimum_spanning_tree(weights: ArrayView2<f32>) -> Result<Vec<(Index, Index, f32)>, Error> {
    let (rows, cols) = weights.dim();
    if rows != cols {
        return Err(Error::InputShape {
            expected: rows,
            actual: cols,
        });
    }
    prim(rows, |u, v| Ok(weights[(u as usize, v as usize)]))
}

/// Spanning tree over predicted distances, oriented away from the shallowest token.
#[derive(Debug)]
pub struct MinimumSpanningTree {
    logger: Logger,
}

impl Default for MinimumSpanningTree {
    fn default() -> Self {
        MinimumSpanningTree::new()
    }
}

impl MinimumSpanningTree {
    pub fn new() -> Self {
        MinimumSpanningTree {
            logger: discard_logger(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

impl TreeBuilder for MinimumSpanningTree {
    fn name(&self) -> &'static str {
        "minimum-spanning-tree"
    }

    fn build(&self, cache: &mut DistanceCache) -> Result<Vec<ScoredArc>, Error> {
        let n = cache.num_tokens();
        let edges = prim(n, |u, v| cache.distance(u, v))?;
        let root = match cache.shallowest()? {
            Some(root) => root,
            None => return Ok(Vec::new()),
        };
        debug!(
            self.logger,
            "spanning tree weight {}, root {}",
            edges.iter().map(|&(_, _, w)| w).sum::<f32>(),
            root
        );

        let mut adjacency: Vec<Vec<(Index, f32)>> = vec![Vec::new(); n];
        for &(u, v, weight) in &edges {
            adjacency[u as usize].push((v, weight));
            adjacency[v as usize].push((u, weight));
        }
        let mut arcs = Vec::with_capacity(n);
        arcs.push(root_arc(cache, root)?);
        let mut visited = vec![false; n];
        visited[root as usize] = true;
        let mut queue: VecDeque<Index> = Some(root).into_iter().collect();
        while let Some(governor) = queue.pop_front() {
            for &(dependent, weight) in &adjacency[governor as usize] {
                if visited[dependent as usize] {
                    continue;
                }
                visited[dependent as usize] = true;
                arcs.push(ScoredArc::new(governor, dependent, -weight));
                queue.push_back(dependent);
            }
        }
        Ok(arcs)
    }
}
