use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Names an environment file to load instead of the nearest `.env`.
pub const ENV_FILE_VAR: &str = "CHAIN_DIFF_ENV_FILE";

/// What happened when looking for an environment file.
#[derive(Debug)]
pub enum EnvFile {
    Loaded(PathBuf),
    /// No `.env` in the working directory or its ancestors.
    Absent,
    Failed(dotenvy::Error),
}

impl EnvFile {
    /// Reports the outcome. Loading happens before the subscriber exists, so
    /// this is called once it does.
    pub fn log(&self) {
        match self {
            EnvFile::Loaded(path) => debug!(path = %path.display(), "loaded environment file"),
            EnvFile::Absent => (),
            EnvFile::Failed(e) => warn!("unable to load the environment file: {e}"),
        }
    }
}

/// Loads the file named by [`ENV_FILE_VAR`], or the nearest `.env` if unset,
/// into the process environment. Variables that are already set win.
pub fn load_env_file() -> EnvFile {
    load_from(std::env::var_os(ENV_FILE_VAR).map(PathBuf::from).as_deref())
}

fn load_from(path: Option<&Path>) -> EnvFile {
    match path {
        // A file asked for by name has to exist.
        Some(path) => match dotenvy::from_path(path) {
            Ok(()) => EnvFile::Loaded(path.to_path_buf()),
            Err(e) => EnvFile::Failed(e),
        },
        None => match dotenvy::dotenv() {
            Ok(path) => EnvFile::Loaded(path),
            Err(dotenvy::Error::Io(_)) => EnvFile::Absent,
            Err(e) => EnvFile::Failed(e),
        },
    }
}
