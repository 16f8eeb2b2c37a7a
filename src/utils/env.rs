use std::env;
use std::error;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub enum VarError {
    NotPresent,
    NotUnicode(OsString),
    Parse(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for VarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VarError::NotPresent => write!(f, "environment variable not found"),
            VarError::NotUnicode(ref s) => {
                write!(f, "environment variable was not valid unicode: {:?}", s)
            }
            VarError::Parse(ref e) => e.fmt(f),
        }
    }
}

impl error::Error for VarError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            VarError::Parse(ref e) => Some(&**e),
            _ => None,
        }
    }
}

/// Reads and parses an environment variable.
pub fn var<K: AsRef<OsStr>, T: FromStr>(key: K) -> Result<T, VarError>
where
    <T as FromStr>::Err: Into<Box<dyn error::Error + Send + Sync>>,
{
    match env::var(key) {
        Ok(s) => s.trim().parse::<T>().map_err(|e| VarError::Parse(e.into())),
        Err(e) => match e {
            env::VarError::NotPresent => Err(VarError::NotPresent),
            env::VarError::NotUnicode(s) => Err(VarError::NotUnicode(s)),
        },
    }
}

/// Like [`var`], but an unset variable yields `None`.
pub fn var_opt<K: AsRef<OsStr>, T: FromStr>(key: K) -> Result<Option<T>, VarError>
where
    <T as FromStr>::Err: Into<Box<dyn error::Error + Send + Sync>>,
{
    match var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(e),
    }
}
