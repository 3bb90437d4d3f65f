use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

pub const PATTERNS_DIR_ENV: &str = "FABRIC_PATTERNS_DIR";
const SYSTEM_FILE: &str = "system.md";

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Fabric patterns directory not found. Please install Fabric first.")]
    DirectoryMissing,
    #[error("Invalid pattern name: {0}")]
    InvalidName(String),
    #[error("Pattern content (system.md) not found for {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Patterns are subdirectories of one directory, each holding a `system.md`.
pub struct PatternCatalog {
    dir: Option<PathBuf>,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl PatternCatalog {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the directory from configuration, then the environment, then
    /// the usual home locations.
    pub fn discover(explicit: Option<PathBuf>) -> Self {
        let dir = resolve_patterns_dir(explicit);
        match &dir {
            Some(dir) => tracing::info!("Using patterns from {}", dir.display()),
            None => tracing::warn!("No patterns directory found"),
        }
        Self::new(dir)
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn list(&self) -> Result<Vec<String>, PatternError> {
        let dir = self.existing_dir()?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !path.is_dir() || !path.join(SYSTEM_FILE).is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        validate_name(name).is_ok()
            && self
                .dir
                .as_ref()
                .is_some_and(|dir| dir.join(name).join(SYSTEM_FILE).is_file())
    }

    pub fn content(&self, name: &str) -> Result<Arc<str>, PatternError> {
        validate_name(name)?;
        if let Ok(cache) = self.cache.read()
            && let Some(content) = cache.get(name)
        {
            return Ok(content.clone());
        }

        let path = self.existing_dir()?.join(name).join(SYSTEM_FILE);
        if !path.is_file() {
            return Err(PatternError::NotFound(name.to_string()));
        }
        let content: Arc<str> = std::fs::read_to_string(&path)?.into();
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(name.to_string(), content.clone());
        }
        Ok(content)
    }

    fn existing_dir(&self) -> Result<&Path, PatternError> {
        match &self.dir {
            Some(dir) if dir.is_dir() => Ok(dir),
            _ => Err(PatternError::DirectoryMissing),
        }
    }
}

fn validate_name(name: &str) -> Result<(), PatternError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..");
    if invalid {
        return Err(PatternError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn resolve_patterns_dir(explicit: Option<PathBuf>) -> Option<PathBuf> {
    let from_env = std::env::var_os(PATTERNS_DIR_ENV).map(PathBuf::from);
    let home = dirs::home_dir();
    let candidates = [
        explicit,
        from_env,
        home.as_ref()
            .map(|h| h.join(".config").join("fabric").join("patterns")),
        home.as_ref().map(|h| h.join(".fabric").join("patterns")),
    ];
    candidates.into_iter().flatten().find(|dir| dir.is_dir())
}
