extern crate chrono;
extern crate ndarray;
extern crate ordered_float;
extern crate rayon;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_term;
extern crate thiserror;

pub mod config;
pub mod logging;
pub mod syntax;
pub mod utils;

pub use crate::config::{BuilderKind, DecoderConfig};
pub use crate::syntax::{DependencyTree, Error, Index, Label, ROOT};
