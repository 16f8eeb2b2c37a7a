extern crate deptree;
#[macro_use]
extern crate slog;
extern crate serde_json;
extern crate tempfile;

mod tests {
    use std::env;
    use std::fs;

    use chrono::TimeZone;

    use deptree::config::{ENV_BEAM_SIZE, ENV_LOG_LEVEL, ENV_MAX_THREADS, ENV_TREE_BUILDER};
    use deptree::logging::{self, Level};
    use deptree::{BuilderKind, DecoderConfig, Error};

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.beam_size, 1);
        assert_eq!(config.max_parallel_threads, 4);
        assert_eq!(config.tree_builder, BuilderKind::LowerDistanceFirst);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config =
            DecoderConfig::from_json(r#"{"beam_size": 8, "tree_builder": "mst"}"#).unwrap();
        assert_eq!(config.beam_size, 8);
        assert_eq!(config.max_parallel_threads, 4);
        assert_eq!(config.tree_builder, BuilderKind::MinimumSpanningTree);

        let config = DecoderConfig::from_json(r#"{"tree_builder": "ShortDistanceFirst"}"#).unwrap();
        assert_eq!(config.tree_builder, BuilderKind::ShortDistanceFirst);

        match DecoderConfig::from_json(r#"{"beam_size": 0}"#) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(DecoderConfig::from_json(r#"{"tree_builder": "cky"}"#).is_err());
        assert!(DecoderConfig::from_json("beam_size = 2").is_err());
    }

    #[test]
    fn test_builder_kind_from_str() {
        assert_eq!("ldf".parse::<BuilderKind>(), Ok(BuilderKind::LowerDistanceFirst));
        assert_eq!("SDF".parse::<BuilderKind>(), Ok(BuilderKind::ShortDistanceFirst));
        assert_eq!("pointer".parse::<BuilderKind>(), Ok(BuilderKind::Pointer));
        assert_eq!(
            "minimum-spanning-tree".parse::<BuilderKind>(),
            Ok(BuilderKind::MinimumSpanningTree)
        );
        assert!("eisner".parse::<BuilderKind>().is_err());
    }

    #[test]
    fn test_from_env() {
        env::set_var(ENV_BEAM_SIZE, " 16 ");
        env::set_var(ENV_TREE_BUILDER, "pointer");
        env::remove_var(ENV_MAX_THREADS);
        let config = DecoderConfig::from_env().unwrap();
        assert_eq!(config.beam_size, 16);
        assert_eq!(config.max_parallel_threads, 4);
        assert_eq!(config.tree_builder, BuilderKind::Pointer);

        env::set_var(ENV_MAX_THREADS, "many");
        assert!(DecoderConfig::from_env().is_err());
        env::remove_var(ENV_MAX_THREADS);

        env::set_var(ENV_LOG_LEVEL, "debug");
        assert_eq!(DecoderConfig::from_env().unwrap().logging.verbosity, Level::Debug);
        env::set_var(ENV_LOG_LEVEL, "chatty");
        assert!(DecoderConfig::from_env().is_err());
        env::remove_var(ENV_LOG_LEVEL);

        env::remove_var(ENV_BEAM_SIZE);
        env::remove_var(ENV_MAX_THREADS);
        env::remove_var(ENV_TREE_BUILDER);
        assert_eq!(DecoderConfig::from_env().unwrap(), DecoderConfig::default());
    }

    #[test]
    fn test_logging_from_json() {
        let config = DecoderConfig::from_json(
            r#"{"logging": {"verbosity": "WARN", "file_level": "trace", "format": "compact"}}"#,
        )
        .unwrap();
        assert_eq!(config.logging.verbosity, Level::Warning);
        assert_eq!(config.logging.file_level, Level::Trace);
        assert_eq!(config.logging.format, logging::Format::Compact);
        assert_eq!(config.logging.filemode, 'a');
        assert!(DecoderConfig::from_json(r#"{"logging": {"verbosity": "loud"}}"#).is_err());

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""verbosity":"warning""#));
        assert_eq!(DecoderConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_file_logger() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = logging::Config::default();
        config.file_level = Level::Debug;
        config.logdir = dir.path().join("logs").to_string_lossy().into_owned();
        config.filename = "decode.log".to_string();
        config.filemode = 'w';
        assert!(!config.is_discarded());
        {
            let logger = logging::create_logger(&config).unwrap();
            info!(logger, "decoded"; "tokens" => 5);
            debug!(logger, "spine merged");
            trace!(logger, "below the file level");
        }
        let content = fs::read_to_string(dir.path().join("logs").join("decode.log")).unwrap();
        assert!(content.contains("decoded"));
        assert!(content.contains("spine merged"));
        assert!(!content.contains("below the file level"));
    }

    #[test]
    fn test_resolve_filepath() {
        let dir = tempfile::tempdir().unwrap();
        let time = chrono::Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let dated = logging::resolve_filepath(dir.path(), "deptree-%Y%m%d.log", time, false)
            .unwrap();
        assert_eq!(dated, dir.path().join("deptree-20240309.log"));

        let path = logging::resolve_filepath(dir.path(), "run.log", time, true).unwrap();
        assert_eq!(path, dir.path().join("run-0.log"));
        fs::write(&path, "").unwrap();
        let next = logging::resolve_filepath(dir.path(), "run.log", time, true).unwrap();
        assert_eq!(next, dir.path().join("run-1.log"));

        assert!(logging::resolve_filepath(dir.path(), "a/run.log", time, false).is_err());
    }
}
