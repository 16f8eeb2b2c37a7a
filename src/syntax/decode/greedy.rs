use slog::Logger;

use super::{discard_logger, score_actions, ActionScorer, Parse};
use crate::config::DecoderConfig;
use crate::syntax::transition::prelude::*;
use crate::syntax::transition::State;
use crate::syntax::Error;

/// Follows the single best legal action at every step.
#[derive(Debug)]
pub struct GreedyDecoder<T: TransitionSystem> {
    system: T,
    logger: Logger,
}

impl<T: TransitionSystem> GreedyDecoder<T> {
    pub fn new(system: T) -> Self {
        GreedyDecoder {
            system,
            logger: discard_logger(),
        }
    }

    pub fn from_config(system: T, config: &DecoderConfig) -> Result<Self, Error> {
        let logger = config.logger()?;
        Ok(GreedyDecoder::new(system).with_logger(logger.new(o!("decoder" => "greedy"))))
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn system(&self) -> &T {
        &self.system
    }

    pub fn decode<A: ActionScorer + ?Sized>(
        &self,
        num_tokens: usize,
        scorer: &A,
    ) -> Result<Parse, Error> {
        let max_steps = self.system.estimate_num_actions(num_tokens);
        let mut state = State::with_capacity(num_tokens as u32, max_steps);
        let mut score = 0.0;
        while !self.system.is_terminal(&state) {
            if state.step() >= max_steps {
                return Err(Error::SearchExhausted { steps: state.step() });
            }
            let actions = self.system.legal_actions(&state);
            let scores = score_actions(scorer, &state, &actions)?;
            // ties go to the earliest action
            let mut best: Option<(usize, f32)> = None;
            for (i, &s) in scores.iter().enumerate() {
                if best.map(|(_, best_score)| s > best_score).unwrap_or(true) {
                    best = Some((i, s));
                }
            }
            let (i, action_score) =
                best.ok_or(Error::InvalidOperation("no legal action in a non-terminal state"))?;
            trace!(
                self.logger,
                "step {}: {} ({}) among {} actions",
                state.step(),
                actions[i],
                action_score,
                actions.len()
            );
            self.system.apply(actions[i], &mut state)?;
            score += action_score;
        }
        debug!(
            self.logger,
            "greedy {} decode finished: {} tokens, {} steps, score {}",
            self.system.name(),
            num_tokens,
            state.step(),
            score
        );
        Parse::from_state(&state, score)
    }
}
