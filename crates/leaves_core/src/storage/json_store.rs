use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::path::{Path, PathBuf};

const STORE_DIR_ENV_VAR: &str = "LEAVES_STORE_DIR";
const APP_DIR_NAME: &str = "leaves";

/// Directory used for the file-backed store.
pub fn store_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
        if !valid || key.starts_with('.') {
            return Err(AppError::invalid_input(format!("invalid store key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        Ok(Some(content))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        std::fs::write(&path, value).map_err(|err| AppError::io(err.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        tracing::debug!(path = %path.display(), bytes = value.len(), "wrote store document");
        Ok(())
    }
}
