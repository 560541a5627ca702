/// Activation registry — which scopes the bot is allowed to talk in.
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the set of active scopes lives between restarts.
pub trait ActivationPersistence {
    /// Read the stored scopes, in order. A store that was never written is empty.
    fn load(&self) -> Result<Vec<String>, ActivationError>;
    /// Replace the stored scopes with `scopes`.
    fn save(&self, scopes: &[String]) -> Result<(), ActivationError>;
}

/// JSON array of scope names in a single file, rewritten via temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileActivation {
    path: PathBuf,
}

impl JsonFileActivation {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActivationPersistence for JsonFileActivation {
    fn load(&self) -> Result<Vec<String>, ActivationError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, scopes: &[String]) -> Result<(), ActivationError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string(scopes)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the set in memory only. Useful for tests and one-off tools.
#[derive(Debug, Default)]
pub struct MemoryActivation {
    saved: RefCell<Vec<String>>,
}

impl MemoryActivation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scopes(scopes: &[&str]) -> Self {
        Self {
            saved: RefCell::new(scopes.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// What was last written through `save`.
    pub fn saved(&self) -> Vec<String> {
        self.saved.borrow().clone()
    }
}

impl ActivationPersistence for MemoryActivation {
    fn load(&self) -> Result<Vec<String>, ActivationError> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, scopes: &[String]) -> Result<(), ActivationError> {
        *self.saved.borrow_mut() = scopes.to_vec();
        Ok(())
    }
}

/// Per-scope on/off switch. Scopes start disabled; `toggle` is the only
/// transition and is flushed to persistence before it is reported.
pub struct ActivationRegistry {
    active: Vec<String>,
    persistence: Box<dyn ActivationPersistence>,
}

impl ActivationRegistry {
    /// Load the current set from `persistence`.
    pub fn load(persistence: Box<dyn ActivationPersistence>) -> Result<Self, ActivationError> {
        let mut active: Vec<String> = Vec::new();
        for scope in persistence.load()? {
            if !active.contains(&scope) {
                active.push(scope);
            }
        }
        log::debug!("[activation] Loaded {} active scopes", active.len());
        Ok(Self {
            active,
            persistence,
        })
    }

    pub fn is_active(&self, scope: &str) -> bool {
        self.active.iter().any(|s| s == scope)
    }

    /// Flip `scope` and persist the whole set. Returns the new state.
    ///
    /// If the write fails the in-memory set is restored and the error returned.
    pub fn toggle(&mut self, scope: &str) -> Result<bool, ActivationError> {
        let previous = self.active.clone();
        let now_active = match self.active.iter().position(|s| s == scope) {
            Some(idx) => {
                self.active.remove(idx);
                false
            }
            None => {
                self.active.push(scope.to_string());
                true
            }
        };

        if let Err(e) = self.persistence.save(&self.active) {
            self.active = previous;
            log::warn!("[activation] Failed to persist toggle for {}: {}", scope, e);
            return Err(e);
        }

        log::info!(
            "[activation] {} {}",
            scope,
            if now_active { "enabled" } else { "disabled" }
        );
        Ok(now_active)
    }

    /// Active scopes in the order they were enabled.
    pub fn active_scopes(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }
}

impl std::fmt::Debug for ActivationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationRegistry")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
