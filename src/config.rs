//! Decoder settings.
//!
//! Settings come from defaults, a JSON document, or `DEPTREE_*` environment variables. The
//! `logging` section describes the logger that decoders and tree builders built from a
//! config write to.

use std::fmt;
use std::str::FromStr;

use slog::Logger;

use crate::syntax::distance::{
    LowerDistanceFirst, MinimumSpanningTree, Pointer, ShortDistanceFirst, TreeBuilder,
};
use crate::logging;
use crate::syntax::Error;
use crate::utils::env;

pub const ENV_BEAM_SIZE: &str = "DEPTREE_BEAM_SIZE";
pub const ENV_MAX_THREADS: &str = "DEPTREE_MAX_THREADS";
pub const ENV_TREE_BUILDER: &str = "DEPTREE_TREE_BUILDER";
pub const ENV_LOG_LEVEL: &str = "DEPTREE_LOG_LEVEL";

/// Selects the distance-based tree construction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuilderKind {
    #[serde(alias = "ldf")]
    LowerDistanceFirst,
    #[serde(alias = "sdf")]
    ShortDistanceFirst,
    #[serde(alias = "pointer")]
    Pointer,
    #[serde(alias = "mst")]
    MinimumSpanningTree,
}

impl BuilderKind {
    pub fn build(&self, logger: Logger) -> Box<dyn TreeBuilder> {
        match *self {
            BuilderKind::LowerDistanceFirst => {
                Box::new(LowerDistanceFirst::new().with_logger(logger))
            }
            BuilderKind::ShortDistanceFirst => {
                Box::new(ShortDistanceFirst::new().with_logger(logger))
            }
            BuilderKind::Pointer => Box::new(Pointer::new().with_logger(logger)),
            BuilderKind::MinimumSpanningTree => {
                Box::new(MinimumSpanningTree::new().with_logger(logger))
            }
        }
    }
}

impl Default for BuilderKind {
    fn default() -> Self {
        BuilderKind::LowerDistanceFirst
    }
}

impl FromStr for BuilderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().as_str() {
            "ldf" | "lower-distance-first" | "lowerdistancefirst" => {
                BuilderKind::LowerDistanceFirst
            }
            "sdf" | "short-distance-first" | "shortdistancefirst" => {
                BuilderKind::ShortDistanceFirst
            }
            "pointer" => BuilderKind::Pointer,
            "mst" | "minimum-spanning-tree" | "minimumspanningtree" => {
                BuilderKind::MinimumSpanningTree
            }
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unknown tree builder: `{}`",
                    s
                )))
            }
        };
        Ok(kind)
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            BuilderKind::LowerDistanceFirst => "lower-distance-first",
            BuilderKind::ShortDistanceFirst => "short-distance-first",
            BuilderKind::Pointer => "pointer",
            BuilderKind::MinimumSpanningTree => "minimum-spanning-tree",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub beam_size: usize,
    pub max_parallel_threads: usize,
    pub tree_builder: BuilderKind,
    pub logging: logging::Config,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            beam_size: 1,
            max_parallel_threads: 4,
            tree_builder: BuilderKind::default(),
            logging: logging::Config::default(),
        }
    }
}

impl DecoderConfig {
    /// Parses a JSON object; missing fields keep their defaults.
    pub fn from_json(s: &str) -> Result<Self, Error> {
        let config: DecoderConfig =
            serde_json::from_str(s).map_err(|e| Error::InvalidArgument(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides the defaults with the `DEPTREE_*` variables that are set.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = DecoderConfig::default();
        if let Some(beam_size) = env::var_opt(ENV_BEAM_SIZE).map_err(env_error(ENV_BEAM_SIZE))? {
            config.beam_size = beam_size;
        }
        if let Some(threads) =
            env::var_opt(ENV_MAX_THREADS).map_err(env_error(ENV_MAX_THREADS))?
        {
            config.max_parallel_threads = threads;
        }
        if let Some(kind) = env::var_opt(ENV_TREE_BUILDER).map_err(env_error(ENV_TREE_BUILDER))? {
            config.tree_builder = kind;
        }
        if let Some(level) =
            env::var_opt::<_, String>(ENV_LOG_LEVEL).map_err(env_error(ENV_LOG_LEVEL))?
        {
            config.logging.verbosity = logging::parse_level(&level)
                .map_err(|e| Error::InvalidArgument(format!("{}: {}", ENV_LOG_LEVEL, e)))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Builds the logger described by `logging`, tagged with the search settings.
    pub fn logger(&self) -> Result<Logger, Error> {
        self.logging
            .build_with_kv(o!(
                "beam_size" => self.beam_size,
                "tree_builder" => self.tree_builder.to_string()
            ))
            .map_err(|e| Error::InvalidArgument(format!("logging: {}", e)))
    }

    /// Instantiates the configured tree builder with a logger from `logger()`.
    pub fn build_tree_builder(&self) -> Result<Box<dyn TreeBuilder>, Error> {
        let logger = self.logger()?;
        Ok(self
            .tree_builder
            .build(logger.new(o!("builder" => self.tree_builder.to_string()))))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.beam_size == 0 {
            return Err(Error::InvalidArgument(
                "beam_size must be greater than 0".to_string(),
            ));
        }
        if self.max_parallel_threads == 0 {
            return Err(Error::InvalidArgument(
                "max_parallel_threads must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_error(key: &'static str) -> impl Fn(env::VarError) -> Error {
    move |e| Error::InvalidArgument(format!("{}: {}", key, e))
}
