use slog::Logger;

use super::ArcScoreTable;
use crate::syntax::decode::discard_logger;
use crate::syntax::{DependencyTree, Error, Index, ROOT};

/// Rewrites a head assignment with cycles into a well-formed tree.
///
/// Each round breaks one cycle by moving the member whose best admissible head outside the
/// cycle loses the least score. Equal losses go to the smallest token id.
///
/// Admissible heads exclude the whole basin of the cycle: its members and every token whose
/// head chain runs into it. A member moved under a basin token would close a new cycle
/// through that token, so excluding only the members would not guarantee progress. With the
/// basin excluded, every round strictly reduces the number of cycles and the number of
/// rounds is bounded by the number of cycles in the input.
#[derive(Debug)]
pub struct CycleResolver {
    logger: Logger,
}

impl Default for CycleResolver {
    fn default() -> Self {
        CycleResolver::new()
    }
}

impl CycleResolver {
    pub fn new() -> Self {
        CycleResolver {
            logger: discard_logger(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn resolve(
        &self,
        tree: &DependencyTree,
        table: &ArcScoreTable,
    ) -> Result<DependencyTree, Error> {
        self.resolve_with_count(tree, table).map(|(tree, _)| tree)
    }

    /// Same as [`resolve`](Self::resolve), also returning the number of cycles broken.
    pub fn resolve_with_count(
        &self,
        tree: &DependencyTree,
        table: &ArcScoreTable,
    ) -> Result<(DependencyTree, usize), Error> {
        if let Some(index) = tree.heads().iter().position(|head| head.is_none()) {
            return Err(Error::InvalidArgument(format!("token {} has no head", index)));
        }
        let mut tree = tree.clone();
        let n = tree.len();
        for iteration in 0..=n {
            let cycle = match tree.find_cycle() {
                Some(cycle) => cycle,
                None => return Ok((tree, iteration)),
            };
            debug!(self.logger, "found cycle {:?}", cycle);
            self.break_cycle(&mut tree, table, cycle)?;
        }
        match tree.find_cycle() {
            Some(cycle) => Err(Error::UnresolvableCycle(cycle)),
            None => Ok((tree, n)),
        }
    }

    fn break_cycle(
        &self,
        tree: &mut DependencyTree,
        table: &ArcScoreTable,
        mut cycle: Vec<Index>,
    ) -> Result<(), Error> {
        cycle.sort();
        let basin = reaching(tree, &cycle);
        let has_root = !tree.roots().is_empty();
        let mut excluded: Vec<Index> = (0..tree.len() as Index)
            .filter(|&index| basin[index as usize])
            .collect();
        if has_root {
            excluded.push(ROOT);
        }

        // (node, new head, new score, loss)
        let mut best: Option<(Index, Index, f32, f32)> = None;
        for &node in &cycle {
            let head = tree.head(node).ok_or(Error::InvalidOperation("head vanished"))?;
            let current = table.get_score(node, head)?;
            if let Some((new_head, score)) = table.find_highest_scoring_head(node, &excluded)? {
                let loss = current - score;
                if best.map(|(_, _, _, best_loss)| loss < best_loss).unwrap_or(true) {
                    best = Some((node, new_head, score, loss));
                }
            }
        }

        let (node, new_head, score) = match best {
            Some((node, new_head, score, loss)) => {
                debug!(
                    self.logger,
                    "break cycle at {}: {:?} -> {} (loss {})",
                    node,
                    tree.head(node),
                    new_head,
                    loss
                );
                (node, new_head, score)
            }
            None if !has_root => {
                let mut root: Option<(Index, f32)> = None;
                for &node in &cycle {
                    if table.is_disabled(node, ROOT) {
                        continue;
                    }
                    if let Ok(score) = table.get_score(node, ROOT) {
                        if root.map(|(_, best)| score > best).unwrap_or(true) {
                            root = Some((node, score));
                        }
                    }
                }
                let (node, score) = root.ok_or_else(|| Error::UnresolvableCycle(cycle.clone()))?;
                debug!(self.logger, "break cycle at {}: attach to ROOT", node);
                (node, ROOT, score)
            }
            None => return Err(Error::UnresolvableCycle(cycle)),
        };
        let label = tree.label(node);
        tree.set_arc(node, new_head, label, Some(score))
    }
}

/// Marks every token whose head chain enters `cycle`, the cycle included.
fn reaching(tree: &DependencyTree, cycle: &[Index]) -> Vec<bool> {
    let n = tree.len();
    let mut marks = vec![false; n];
    for &index in cycle {
        marks[index as usize] = true;
    }
    for start in 0..n {
        let mut current = start as Index;
        for _ in 0..n {
            if marks[current as usize] {
                marks[start] = true;
                break;
            }
            match tree.head(current) {
                Some(head) if head != ROOT => current = head,
                _ => break,
            }
        }
    }
    marks
}
