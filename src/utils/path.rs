use std::env;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Expands a leading `~` to `$HOME`. `~user` forms are returned unchanged.
pub fn expandtilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path_str = match path.as_ref().to_str() {
        Some(s) => s,
        None => return path.as_ref().to_path_buf(),
    };
    if !path_str.starts_with('~') {
        return path.as_ref().to_path_buf();
    }
    let i = path_str.find(MAIN_SEPARATOR).unwrap_or(path_str.len());
    if i != 1 {
        return path.as_ref().to_path_buf();
    }
    match env::var_os("HOME") {
        Some(home) => {
            let mut home = PathBuf::from(home);
            if i < path_str.len() - 1 {
                home.push(&path_str[i + 1..]);
            }
            home
        }
        None => path.as_ref().to_path_buf(),
    }
}
