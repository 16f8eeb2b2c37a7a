#![allow(dead_code)]

pub mod mock {
    use std::cell::Cell;

    use deptree::syntax::distance::DistanceOracle;
    use deptree::syntax::transition::prelude::*;
    use deptree::syntax::transition::{State, Transition};
    use deptree::{Index, Label, ROOT};
    use ndarray::{Array2, ArrayView1};

    pub const NUM_LABELS: usize = 8;

    /// Projective gold trees as `(heads, labels)`.
    pub fn provide_gold_trees() -> Vec<(Vec<Index>, Vec<Label>)> {
        vec![
            // John saw a dog yesterday
            (vec![1, ROOT, 3, 1, 1], vec![0, 1, 2, 3, 4]),
            // The cat sat on the mat .
            (vec![1, 2, ROOT, 5, 5, 2, 2], vec![2, 0, 1, 5, 2, 6, 7]),
            // right branching
            (vec![ROOT, 0, 1, 2], vec![1, 3, 3, 3]),
            // left branching
            (vec![1, 2, 3, ROOT], vec![2, 2, 0, 1]),
            // single token
            (vec![ROOT], vec![1]),
        ]
    }

    /// Gives 1.0 to the action the static oracle takes from each state, 0.0 otherwise.
    pub fn gold_scorer<'a, T: TransitionSystem>(
        system: &'a T,
        heads: &'a [Index],
        labels: &'a [Label],
    ) -> impl Fn(&State, &[Transition]) -> Vec<f32> + Sync + 'a {
        move |state: &State, actions: &[Transition]| {
            let gold = system.oracle(state, heads, labels);
            actions
                .iter()
                .map(|&action| if Some(action) == gold { 1.0 } else { 0.0 })
                .collect()
        }
    }

    /// Oracle over precomputed matrices; token `i` is encoded as the vector `[i]`.
    pub struct MatrixOracle {
        distances: Array2<f32>,
        depths: Vec<f32>,
        distance_calls: Cell<usize>,
        depth_calls: Cell<usize>,
    }

    impl MatrixOracle {
        pub fn new(distances: Array2<f32>, depths: Vec<f32>) -> Self {
            MatrixOracle {
                distances,
                depths,
                distance_calls: Cell::new(0),
                depth_calls: Cell::new(0),
            }
        }

        /// Distances are path lengths in the tree given by `heads`, depths are the number
        /// of arcs from the top token.
        pub fn from_heads(heads: &[Index]) -> Self {
            let n = heads.len();
            let ancestors: Vec<Vec<usize>> = (0..n)
                .map(|i| {
                    let mut chain = vec![i];
                    let mut current = i;
                    while heads[current] != ROOT {
                        current = heads[current] as usize;
                        chain.push(current);
                    }
                    chain
                })
                .collect();
            let depths: Vec<f32> = ancestors.iter().map(|c| (c.len() - 1) as f32).collect();
            let mut distances = Array2::zeros((n, n));
            for i in 0..n {
                for j in 0..n {
                    let (a, b) = (&ancestors[i], &ancestors[j]);
                    let mut common = 0;
                    while common < a.len()
                        && common < b.len()
                        && a[a.len() - 1 - common] == b[b.len() - 1 - common]
                    {
                        common += 1;
                    }
                    distances[(i, j)] = ((a.len() - common) + (b.len() - common)) as f32;
                }
            }
            MatrixOracle::new(distances, depths)
        }

        pub fn num_tokens(&self) -> usize {
            self.depths.len()
        }

        pub fn encodings(&self) -> Array2<f32> {
            Array2::from_shape_fn((self.num_tokens(), 1), |(i, _)| i as f32)
        }

        pub fn distance_calls(&self) -> usize {
            self.distance_calls.get()
        }

        pub fn depth_calls(&self) -> usize {
            self.depth_calls.get()
        }
    }

    impl DistanceOracle for MatrixOracle {
        fn dim(&self) -> usize {
            1
        }

        fn distance(&self, u: ArrayView1<f32>, v: ArrayView1<f32>) -> f32 {
            self.distance_calls.set(self.distance_calls.get() + 1);
            self.distances[(u[0] as usize, v[0] as usize)]
        }

        fn depth(&self, u: ArrayView1<f32>) -> f32 {
            self.depth_calls.set(self.depth_calls.get() + 1);
            self.depths[u[0] as usize]
        }
    }
}
