//! Tree assembly from dependent/governor score tables.

use slog::Logger;

pub use self::cycle::CycleResolver;
pub use self::score::ArcScoreTable;

use super::{DependencyTree, Error, Index, ROOT};

mod cycle;
mod score;

/// Picks the best head of every token independently.
///
/// The token with the highest ROOT score becomes the top of the tree; every other token takes
/// its best non-ROOT governor. The result has exactly one root but may contain cycles.
pub fn greedy_heads(table: &ArcScoreTable) -> Result<DependencyTree, Error> {
    let n = table.check_complete()?;
    let mut tree = DependencyTree::new(n);
    if n == 0 {
        return Ok(tree);
    }
    let (root, root_score) = table.find_highest_scoring_root().ok_or(Error::Lookup {
        dependent: 0,
        governor: Some(ROOT),
    })?;
    tree.set_arc(root, ROOT, None, Some(root_score))?;
    for dependent in 0..n as Index {
        if dependent == root {
            continue;
        }
        let (head, score) = table
            .find_highest_scoring_head(dependent, &[ROOT])?
            .ok_or(Error::Lookup {
                dependent,
                governor: None,
            })?;
        tree.set_arc(dependent, head, None, Some(score))?;
    }
    Ok(tree)
}

/// Finds a dependency tree by a greedy spanning tree algorithm
///
/// Heads are chosen by [`greedy_heads`] and the cycles this produces are broken by a
/// [`CycleResolver`].
///
/// References:
/// - http://aclweb.org/anthology/K17-3002
/// - https://github.com/tdozat/Parser-v2/blob/6229befd7ab72565569d9f8aaa98401e8112971d/parser/misc/mst.py
pub fn simple_spanning_tree(table: &ArcScoreTable, logger: &Logger) -> Result<DependencyTree, Error> {
    let tree = greedy_heads(table)?;
    let resolver = CycleResolver::new().with_logger(logger.new(o!("component" => "cycle")));
    let tree = resolver.resolve(&tree, table)?;
    tree.validate()?;
    Ok(tree)
}
