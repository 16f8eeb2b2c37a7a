extern crate deptree;
extern crate ndarray;
extern crate tempfile;

mod test_utils;

mod tests {
    use std::fs;

    use deptree::logging::Level;
    use deptree::syntax::decode::{BeamDecoder, GreedyDecoder};
    use deptree::syntax::transition::prelude::*;
    use deptree::syntax::transition::{ArcEager, ArcStandard, State, Transition};
    use deptree::{DecoderConfig, Error, ROOT};

    use super::test_utils::mock;

    /// Deterministic scores that depend on the state and on the action.
    fn pseudo_scores(state: &State, actions: &[Transition]) -> Vec<f32> {
        actions
            .iter()
            .map(|action| {
                let key = state.step() * 31
                    + action.into_action() as usize * 17
                    + state.stack_size() * 7
                    + state.buffer_size() * 3;
                (key % 11) as f32 / 10.0
            })
            .collect()
    }

    /// `[0.9, 0.1]` whenever exactly two actions are legal.
    fn two_way_scores(_state: &State, actions: &[Transition]) -> Vec<f32> {
        if actions.len() == 2 {
            vec![0.9, 0.1]
        } else {
            vec![0.0; actions.len()]
        }
    }

    #[test]
    fn test_greedy_recovers_gold() {
        let standard = GreedyDecoder::new(ArcStandard::new(mock::NUM_LABELS));
        let eager = GreedyDecoder::new(ArcEager::new(mock::NUM_LABELS));
        for (heads, labels) in mock::provide_gold_trees() {
            let expected: Vec<_> = heads.iter().map(|&head| Some(head)).collect();

            let scorer = mock::gold_scorer(standard.system(), &heads, &labels);
            let parse = standard.decode(heads.len(), &scorer).unwrap();
            assert_eq!(parse.tree.heads(), expected.as_slice());
            assert_eq!(parse.actions.len(), 2 * heads.len());
            assert_eq!(parse.score, parse.actions.len() as f32);

            let scorer = mock::gold_scorer(eager.system(), &heads, &labels);
            let parse = eager.decode(heads.len(), &scorer).unwrap();
            assert_eq!(parse.tree.heads(), expected.as_slice());
            assert_eq!(parse.score, parse.actions.len() as f32);
        }
    }

    #[test]
    fn test_beam_of_one_equals_greedy() {
        for num_tokens in 1..10 {
            let greedy = GreedyDecoder::new(ArcEager::new(3));
            let beam = BeamDecoder::new(ArcEager::new(3), 1, 4).unwrap();
            let expected = greedy.decode(num_tokens, &pseudo_scores).unwrap();
            let actual = beam.decode(num_tokens, &pseudo_scores).unwrap();
            assert_eq!(actual, expected);

            let greedy = GreedyDecoder::new(ArcStandard::new(3));
            let beam = BeamDecoder::new(ArcStandard::new(3), 1, 4).unwrap();
            let expected = greedy.decode(num_tokens, &pseudo_scores).unwrap();
            let actual = beam.decode(num_tokens, &pseudo_scores).unwrap();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_beam_pruning() {
        let beam = BeamDecoder::new(ArcEager::new(1), 1, 1).unwrap();
        let parse = beam.decode(2, &two_way_scores).unwrap();
        assert_eq!(
            parse.actions,
            vec![
                Transition::Shift,
                Transition::LeftArc(0),
                Transition::Shift,
                Transition::Root,
            ]
        );
        assert_eq!(parse.tree.heads(), &[Some(1), Some(ROOT)]);
        assert!((parse.score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_wider_beam_finds_better_sequence() {
        for &threads in &[1, 2, 4] {
            let beam = BeamDecoder::new(ArcEager::new(1), 2, threads).unwrap();
            let parse = beam.decode(2, &two_way_scores).unwrap();
            assert_eq!(
                parse.actions,
                vec![
                    Transition::Shift,
                    Transition::RightArc(0),
                    Transition::Reduce,
                    Transition::Root,
                ]
            );
            assert_eq!(parse.tree.heads(), &[Some(ROOT), Some(0)]);
            assert!((parse.score - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_beam_recovers_gold() {
        let config = DecoderConfig {
            beam_size: 4,
            max_parallel_threads: 2,
            ..DecoderConfig::default()
        };
        let beam = BeamDecoder::from_config(ArcStandard::new(mock::NUM_LABELS), &config).unwrap();
        assert_eq!(beam.beam_size(), 4);
        assert_eq!(beam.max_parallel_threads(), 2);
        for (heads, labels) in mock::provide_gold_trees() {
            let scorer = mock::gold_scorer(beam.system(), &heads, &labels);
            let parse = beam.decode(heads.len(), &scorer).unwrap();
            let expected: Vec<_> = heads.iter().map(|&head| Some(head)).collect();
            assert_eq!(parse.tree.heads(), expected.as_slice());
            assert_eq!(parse.score, (2 * heads.len()) as f32);
        }
    }

    #[test]
    fn test_decoders_log_through_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DecoderConfig {
            beam_size: 2,
            ..DecoderConfig::default()
        };
        config.logging.file_level = Level::Debug;
        config.logging.logdir = dir.path().to_string_lossy().into_owned();
        config.logging.filename = "decode.log".to_string();
        config.logging.filemode = 'a';
        let trees = mock::provide_gold_trees();
        let (heads, labels) = &trees[0];
        {
            let beam =
                BeamDecoder::from_config(ArcStandard::new(mock::NUM_LABELS), &config).unwrap();
            let scorer = mock::gold_scorer(beam.system(), heads, labels);
            beam.decode(heads.len(), &scorer).unwrap();
            let greedy =
                GreedyDecoder::from_config(ArcStandard::new(mock::NUM_LABELS), &config).unwrap();
            greedy.decode(heads.len(), &scorer).unwrap();
        }
        let content = fs::read_to_string(dir.path().join("decode.log")).unwrap();
        assert!(content.contains("beam arc-standard decode finished"));
        assert!(content.contains("greedy arc-standard decode finished"));
        assert!(content.contains("decoder: beam"));
        assert!(content.contains("beam_size: 2"));

        config.logging.filemode = 'x';
        match BeamDecoder::from_config(ArcStandard::new(mock::NUM_LABELS), &config) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_close() {
        let mut beam = BeamDecoder::new(ArcStandard::new(2), 3, 2).unwrap();
        assert!(beam.decode(3, &pseudo_scores).is_ok());
        beam.close();
        beam.close();
        assert!(beam.is_closed());
        assert_eq!(beam.decode(3, &pseudo_scores), Err(Error::Closed));
    }

    #[test]
    fn test_invalid_scores() {
        let wrong_length = |_: &State, actions: &[Transition]| vec![0.0; actions.len() + 1];
        let greedy = GreedyDecoder::new(ArcStandard::new(2));
        assert_eq!(
            greedy.decode(2, &wrong_length),
            Err(Error::InputShape {
                expected: 1,
                actual: 2,
            })
        );
        let beam = BeamDecoder::new(ArcStandard::new(2), 2, 2).unwrap();
        assert_eq!(
            beam.decode(2, &wrong_length),
            Err(Error::InputShape {
                expected: 1,
                actual: 2,
            })
        );

        let nan = |_: &State, actions: &[Transition]| vec![std::f32::NAN; actions.len()];
        match greedy.decode(2, &nan) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_beam_settings() {
        assert!(BeamDecoder::new(ArcStandard::new(2), 0, 1).is_err());
        assert!(BeamDecoder::new(ArcStandard::new(2), 2, 0).is_err());
    }

    #[test]
    fn test_empty_sentence() {
        let greedy = GreedyDecoder::new(ArcStandard::new(2));
        let parse = greedy.decode(0, &pseudo_scores).unwrap();
        assert!(parse.tree.is_empty());
        assert!(parse.actions.is_empty());
        assert_eq!(parse.score, 0.0);
    }
}
