use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use slog::Logger;

use super::{discard_logger, score_actions, ActionScorer, Parse};
use crate::config::DecoderConfig;
use crate::syntax::transition::prelude::*;
use crate::syntax::transition::{State, Transition};
use crate::syntax::Error;

#[derive(Debug, Clone)]
struct Hypothesis {
    state: State,
    score: f32,
}

/// A ranked successor of a hypothesis; `action` is `None` for a terminal hypothesis that is
/// carried over unchanged.
#[derive(Debug)]
struct Candidate {
    hypothesis: usize,
    action: Option<Transition>,
    score: f32,
}

/// Keeps the `beam_size` best partial sequences by cumulative score.
///
/// Hypotheses of one step are scored concurrently on a pool of at most
/// `max_parallel_threads` threads; selection waits for every hypothesis of the step. With
/// `beam_size == 1` no pool is created and the result equals that of a
/// [`GreedyDecoder`](super::GreedyDecoder).
pub struct BeamDecoder<T: TransitionSystem> {
    system: T,
    beam_size: usize,
    max_parallel_threads: usize,
    pool: Option<ThreadPool>,
    closed: bool,
    logger: Logger,
}

impl<T: TransitionSystem> BeamDecoder<T> {
    pub fn new(system: T, beam_size: usize, max_parallel_threads: usize) -> Result<Self, Error> {
        if beam_size == 0 {
            return Err(Error::InvalidArgument(
                "beam size must be positive".to_string(),
            ));
        }
        if max_parallel_threads == 0 {
            return Err(Error::InvalidArgument(
                "max_parallel_threads must be positive".to_string(),
            ));
        }
        let pool = if beam_size > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(max_parallel_threads.min(beam_size))
                .thread_name(|i| format!("beam-scorer-{}", i))
                .build()
                .map_err(|e| Error::InvalidArgument(e.to_string()))?;
            Some(pool)
        } else {
            None
        };
        Ok(BeamDecoder {
            system,
            beam_size,
            max_parallel_threads,
            pool,
            closed: false,
            logger: discard_logger(),
        })
    }

    /// Builds a decoder from the search settings of `config` that logs through
    /// `config.logger()`.
    pub fn from_config(system: T, config: &DecoderConfig) -> Result<Self, Error> {
        let logger = config.logger()?;
        let decoder = BeamDecoder::new(system, config.beam_size, config.max_parallel_threads)?;
        Ok(decoder.with_logger(logger.new(o!("decoder" => "beam"))))
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn system(&self) -> &T {
        &self.system
    }

    pub fn beam_size(&self) -> usize {
        self.beam_size
    }

    pub fn max_parallel_threads(&self) -> usize {
        self.max_parallel_threads
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the scoring pool. Calling `decode` afterwards fails with [`Error::Closed`].
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.pool = None;
        self.closed = true;
        debug!(self.logger, "beam decoder closed");
    }

    pub fn decode<A: ActionScorer + ?Sized>(
        &self,
        num_tokens: usize,
        scorer: &A,
    ) -> Result<Parse, Error> {
        if self.closed {
            return Err(Error::Closed);
        }
        let max_steps = self.system.estimate_num_actions(num_tokens);
        let mut beam = vec![Hypothesis {
            state: State::with_capacity(num_tokens as u32, max_steps),
            score: 0.0,
        }];
        let mut step = 0;
        while step < max_steps && !beam.iter().all(|h| self.system.is_terminal(&h.state)) {
            let expansions = self.expand_all(&beam, scorer)?;
            let mut candidates = Vec::new();
            for (i, (hypothesis, expansion)) in beam.iter().zip(expansions).enumerate() {
                match expansion {
                    Some(scored_actions) => {
                        candidates.extend(scored_actions.into_iter().map(|(action, score)| {
                            Candidate {
                                hypothesis: i,
                                action: Some(action),
                                score: hypothesis.score + score,
                            }
                        }))
                    }
                    None => candidates.push(Candidate {
                        hypothesis: i,
                        action: None,
                        score: hypothesis.score,
                    }),
                }
            }
            if candidates.is_empty() {
                return Err(Error::InvalidOperation(
                    "no legal action in a non-terminal state",
                ));
            }
            // stable: ties keep generation order
            candidates.sort_by_key(|c| Reverse(OrderedFloat(c.score)));
            let num_candidates = candidates.len();
            candidates.truncate(self.beam_size);

            let mut next_beam = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                let mut state = beam[candidate.hypothesis].state.clone();
                if let Some(action) = candidate.action {
                    self.system.apply(action, &mut state)?;
                }
                next_beam.push(Hypothesis {
                    state,
                    score: candidate.score,
                });
            }
            trace!(
                self.logger,
                "step {}: kept {} of {} candidates, best score {}",
                step,
                next_beam.len(),
                num_candidates,
                next_beam[0].score
            );
            beam = next_beam;
            step += 1;
        }

        let best = beam
            .iter()
            .find(|h| self.system.is_terminal(&h.state))
            .ok_or(Error::SearchExhausted { steps: step })?;
        debug!(
            self.logger,
            "beam {} decode finished: {} tokens, {} steps, beam size {}, score {}",
            self.system.name(),
            num_tokens,
            step,
            self.beam_size,
            best.score
        );
        Parse::from_state(&best.state, best.score)
    }

    /// Scores every live hypothesis; `None` marks a terminal one.
    fn expand_all<A: ActionScorer + ?Sized>(
        &self,
        beam: &[Hypothesis],
        scorer: &A,
    ) -> Result<Vec<Option<Vec<(Transition, f32)>>>, Error> {
        let system = &self.system;
        let expand = |hypothesis: &Hypothesis| -> Result<Option<Vec<(Transition, f32)>>, Error> {
            if system.is_terminal(&hypothesis.state) {
                return Ok(None);
            }
            let actions = system.legal_actions(&hypothesis.state);
            let scores = score_actions(scorer, &hypothesis.state, &actions)?;
            Ok(Some(actions.into_iter().zip(scores).collect()))
        };
        match self.pool {
            Some(ref pool) => pool.install(|| beam.par_iter().map(expand).collect()),
            None => beam.iter().map(expand).collect(),
        }
    }
}
