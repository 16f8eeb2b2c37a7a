use std::collections::{BTreeMap, BTreeSet};

use ndarray::ArrayView2;

use crate::syntax::{Error, Index, ROOT};

/// Dependent -> governor -> score map for one sentence.
///
/// Governors are iterated in ascending id order, so ties always resolve to the smallest
/// governor id and ROOT (the largest id) loses every tie.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArcScoreTable {
    scores: BTreeMap<Index, BTreeMap<Index, f32>>,
    disabled: BTreeSet<(Index, Index)>,
}

impl ArcScoreTable {
    pub fn new() -> Self {
        ArcScoreTable::default()
    }

    /// Builds a complete table from a `[dependents, 1 + heads]` matrix whose first column
    /// holds the ROOT scores; column `j + 1` is governor `j`. The diagonal is ignored.
    pub fn from_matrix(scores: ArrayView2<f32>) -> Result<Self, Error> {
        let (n, cols) = scores.dim();
        if cols != n + 1 {
            return Err(Error::InputShape {
                expected: n + 1,
                actual: cols,
            });
        }
        let mut table = ArcScoreTable::new();
        for dependent in 0..n {
            table.insert(dependent as Index, ROOT, scores[(dependent, 0)])?;
            for governor in 0..n {
                if governor != dependent {
                    table.insert(
                        dependent as Index,
                        governor as Index,
                        scores[(dependent, governor + 1)],
                    )?;
                }
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, dependent: Index, governor: Index, score: f32) -> Result<(), Error> {
        if dependent == ROOT || dependent == governor {
            return Err(Error::InvalidArgument(format!(
                "cannot score arc {} -> {}",
                governor, dependent
            )));
        }
        if score.is_nan() {
            return Err(Error::InvalidArgument(format!(
                "score of arc {} -> {} is NaN",
                governor, dependent
            )));
        }
        self.scores
            .entry(dependent)
            .or_insert_with(BTreeMap::new)
            .insert(governor, score);
        Ok(())
    }

    pub fn num_dependents(&self) -> usize {
        self.scores.len()
    }

    pub fn dependents<'a>(&'a self) -> impl Iterator<Item = Index> + 'a {
        self.scores.keys().cloned()
    }

    /// Checks that dependents are exactly `0..n` and that every dependent is scored against
    /// ROOT and every other token.
    pub fn check_complete(&self) -> Result<usize, Error> {
        let n = self.scores.len();
        for (expected, (&dependent, governors)) in self.scores.iter().enumerate() {
            if dependent as usize != expected {
                return Err(Error::Lookup {
                    dependent: expected as Index,
                    governor: None,
                });
            }
            if !governors.contains_key(&ROOT) {
                return Err(Error::Lookup {
                    dependent,
                    governor: Some(ROOT),
                });
            }
            for governor in 0..n as Index {
                if governor != dependent && !governors.contains_key(&governor) {
                    return Err(Error::Lookup {
                        dependent,
                        governor: Some(governor),
                    });
                }
            }
        }
        Ok(n)
    }

    pub fn get_score(&self, dependent: Index, governor: Index) -> Result<f32, Error> {
        self.scores
            .get(&dependent)
            .ok_or(Error::Lookup {
                dependent,
                governor: None,
            })?
            .get(&governor)
            .cloned()
            .ok_or(Error::Lookup {
                dependent,
                governor: Some(governor),
            })
    }

    pub fn disable(&mut self, dependent: Index, governor: Index) {
        self.disabled.insert((dependent, governor));
    }

    pub fn enable(&mut self, dependent: Index, governor: Index) {
        self.disabled.remove(&(dependent, governor));
    }

    pub fn is_disabled(&self, dependent: Index, governor: Index) -> bool {
        self.disabled.contains(&(dependent, governor))
    }

    pub fn clear_disabled(&mut self) {
        self.disabled.clear();
    }

    /// Best governor of `dependent` outside `excluded` and the disabled arcs, if any remains.
    pub fn find_highest_scoring_head(
        &self,
        dependent: Index,
        excluded: &[Index],
    ) -> Result<Option<(Index, f32)>, Error> {
        let governors = self.scores.get(&dependent).ok_or(Error::Lookup {
            dependent,
            governor: None,
        })?;
        let mut best: Option<(Index, f32)> = None;
        for (&governor, &score) in governors {
            if excluded.contains(&governor) || self.is_disabled(dependent, governor) {
                continue;
            }
            if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                best = Some((governor, score));
            }
        }
        Ok(best)
    }

    /// The dependent with the highest ROOT score; ties go to the smallest dependent id.
    pub fn find_highest_scoring_root(&self) -> Option<(Index, f32)> {
        let mut best: Option<(Index, f32)> = None;
        for (&dependent, governors) in &self.scores {
            if self.is_disabled(dependent, ROOT) {
                continue;
            }
            if let Some(&score) = governors.get(&ROOT) {
                if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                    best = Some((dependent, score));
                }
            }
        }
        best
    }
}
