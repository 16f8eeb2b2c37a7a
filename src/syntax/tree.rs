use std::fmt;

use super::{Error, Index, Label, ROOT};

/// Head attachments for one sentence.
///
/// Nodes live in flat arrays indexed by token id; the dependents of a node are derived from
/// `heads` on demand instead of being stored as back-pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyTree {
    heads: Vec<Option<Index>>,
    labels: Vec<Option<Label>>,
    scores: Vec<Option<f32>>,
}

impl DependencyTree {
    pub fn new(num_tokens: usize) -> Self {
        DependencyTree {
            heads: vec![None; num_tokens],
            labels: vec![None; num_tokens],
            scores: vec![None; num_tokens],
        }
    }

    /// Builds a tree from a complete head array. The result is not validated.
    pub fn from_heads(heads: &[Index]) -> Result<Self, Error> {
        let mut tree = DependencyTree::new(heads.len());
        for (index, &head) in heads.iter().enumerate() {
            tree.set_arc(index as Index, head, None, None)?;
        }
        Ok(tree)
    }

    /// Builds a tree from `(governor, dependent, score)` triples.
    pub fn from_arcs<I>(num_tokens: usize, arcs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (Index, Index, f32)>,
    {
        let mut tree = DependencyTree::new(num_tokens);
        for (governor, dependent, score) in arcs {
            if tree.head(dependent).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "token {} is attached twice",
                    dependent
                )));
            }
            tree.set_arc(dependent, governor, None, Some(score))?;
        }
        Ok(tree)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Attaches `dependent` to `head`, replacing any previous attachment.
    pub fn set_arc(
        &mut self,
        dependent: Index,
        head: Index,
        label: Option<Label>,
        score: Option<f32>,
    ) -> Result<(), Error> {
        let n = self.len() as Index;
        if dependent >= n {
            return Err(Error::InvalidArgument(format!(
                "dependent {} is out of range for {} tokens",
                dependent, n
            )));
        }
        if head != ROOT && head >= n {
            return Err(Error::InvalidArgument(format!(
                "head {} is out of range for {} tokens",
                head, n
            )));
        }
        if head == dependent {
            return Err(Error::InvalidArgument(format!(
                "token {} cannot be its own head",
                dependent
            )));
        }
        let i = dependent as usize;
        self.heads[i] = Some(head);
        self.labels[i] = label;
        self.scores[i] = score;
        Ok(())
    }

    pub fn head(&self, index: Index) -> Option<Index> {
        self.heads.get(index as usize).and_then(|&head| head)
    }

    pub fn heads(&self) -> &[Option<Index>] {
        &self.heads
    }

    pub fn label(&self, index: Index) -> Option<Label> {
        self.labels.get(index as usize).and_then(|&label| label)
    }

    pub fn labels(&self) -> &[Option<Label>] {
        &self.labels
    }

    pub fn score(&self, index: Index) -> Option<f32> {
        self.scores.get(index as usize).and_then(|&score| score)
    }

    /// Sum of all per-arc scores that are present.
    pub fn total_score(&self) -> f32 {
        self.scores.iter().filter_map(|&score| score).sum()
    }

    pub fn roots(&self) -> Vec<Index> {
        self.heads
            .iter()
            .enumerate()
            .filter(|&(_, &head)| head == Some(ROOT))
            .map(|(index, _)| index as Index)
            .collect()
    }

    /// The top token, if exactly one exists.
    pub fn root(&self) -> Option<Index> {
        let roots = self.roots();
        if roots.len() == 1 {
            Some(roots[0])
        } else {
            None
        }
    }

    /// Dependents of every token, in ascending order.
    pub fn dependents(&self) -> Vec<Vec<Index>> {
        let mut dependents = vec![Vec::new(); self.len()];
        for (index, &head) in self.heads.iter().enumerate() {
            if let Some(head) = head {
                if head != ROOT {
                    dependents[head as usize].push(index as Index);
                }
            }
        }
        dependents
    }

    /// Returns the members of the first cycle reached by following head pointers, in the
    /// order they are visited.
    pub fn find_cycle(&self) -> Option<Vec<Index>> {
        find_cycle(&self.heads)
    }

    /// Checks the single-head, single-root and acyclicity constraints.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(index) = self.heads.iter().position(|head| head.is_none()) {
            return Err(Error::InvalidArgument(format!("token {} has no head", index)));
        }
        if let Some(cycle) = self.find_cycle() {
            return Err(Error::UnresolvableCycle(cycle));
        }
        let roots = self.roots();
        if !self.is_empty() && roots.len() != 1 {
            return Err(Error::InvalidArgument(format!(
                "expected exactly one root, found {:?}",
                roots
            )));
        }
        Ok(())
    }

    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether no two arcs cross (the arc from ROOT spans the whole sentence).
    pub fn is_projective(&self) -> bool {
        let spans: Vec<(i64, i64)> = self
            .heads
            .iter()
            .enumerate()
            .filter_map(|(index, &head)| head.map(|head| (index as i64, head)))
            .map(|(index, head)| {
                let head = if head == ROOT { -1 } else { head as i64 };
                (index.min(head), index.max(head))
            })
            .collect();
        for &(l1, r1) in &spans {
            for &(l2, r2) in &spans {
                if l1 < l2 && l2 < r1 && r1 < r2 {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Display for DependencyTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let heads: Vec<String> = self
            .heads
            .iter()
            .map(|head| match *head {
                Some(ROOT) => "ROOT".to_string(),
                Some(head) => head.to_string(),
                None => "_".to_string(),
            })
            .collect();
        write!(f, "[{}]", heads.join(" "))
    }
}

pub(crate) fn find_cycle(heads: &[Option<Index>]) -> Option<Vec<Index>> {
    // 0: unvisited, 1: on the current path, 2: finished
    let mut marks = vec![0u8; heads.len()];
    for start in 0..heads.len() {
        if marks[start] != 0 {
            continue;
        }
        let mut path = Vec::new();
        let mut current = start;
        loop {
            match marks[current] {
                1 => {
                    let from = path.iter().position(|&i| i == current).unwrap_or(0);
                    return Some(path[from..].iter().map(|&i| i as Index).collect());
                }
                2 => break,
                _ => {}
            }
            marks[current] = 1;
            path.push(current);
            match heads[current] {
                Some(head) if head != ROOT && (head as usize) < heads.len() => {
                    current = head as usize;
                }
                _ => break,
            }
        }
        for i in path {
            marks[i] = 2;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cycle() {
        assert_eq!(find_cycle(&[Some(ROOT), Some(0), Some(1), Some(2)]), None);
        assert_eq!(
            find_cycle(&[Some(ROOT), Some(2), Some(3), Some(1)]),
            Some(vec![1, 2, 3])
        );
        assert_eq!(find_cycle(&[Some(1), Some(0)]), Some(vec![0, 1]));
        assert_eq!(find_cycle(&[None, Some(0), Some(1)]), None);
    }

    #[test]
    fn test_is_projective() {
        let tree = DependencyTree::from_heads(&[1, ROOT, 1, 2]).unwrap();
        assert!(tree.is_projective());
        // 0 -> 2 crosses 1 -> 3
        let tree = DependencyTree::from_heads(&[ROOT, 3, 0, 0]).unwrap();
        assert!(!tree.is_projective());
    }
}
