//! Rule storage
//!
//! [`FileRuleStore`] reads and parses the rule resource on every load.
//! [`CachedRuleStore`] wraps another store and keeps each definition after its first
//! load, which is only correct while the resources do not change.

use crate::error::{EvalError, EvalResult};
use crate::rule::RuleDefinition;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait for loading rule definitions
pub trait RuleStore: Send + Sync {
    /// Load the definition stored at `location`
    fn load(&self, location: &Path) -> EvalResult<RuleDefinition>;
}

/// Rule store reading JSON files from disk
#[derive(Debug, Clone, Default)]
pub struct FileRuleStore {
    rules_folder: Option<PathBuf>,
}

impl FileRuleStore {
    /// Create a store resolving locations as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store resolving relative locations against `rules_folder`
    pub fn with_rules_folder(rules_folder: impl Into<PathBuf>) -> Self {
        Self {
            rules_folder: Some(rules_folder.into()),
        }
    }

    /// Get the rules folder
    pub fn rules_folder(&self) -> Option<&Path> {
        self.rules_folder.as_deref()
    }

    /// Resolve a location to the file that will be read
    pub fn resolve(&self, location: &Path) -> PathBuf {
        match &self.rules_folder {
            Some(folder) if location.is_relative() => folder.join(location),
            _ => location.to_path_buf(),
        }
    }
}

impl RuleStore for FileRuleStore {
    fn load(&self, location: &Path) -> EvalResult<RuleDefinition> {
        let path = self.resolve(location);
        let display = path.display().to_string();

        if !path.is_file() {
            return Err(EvalError::resource_not_found(display));
        }

        let content =
            fs::read_to_string(&path).map_err(|e| EvalError::resource_io(&display, e.to_string()))?;
        let definition =
            RuleDefinition::from_json(&content).map_err(|e| EvalError::parse(&display, e.to_string()))?;

        log::debug!(
            "Loaded rule {} ({} parameters, {} entries)",
            display,
            definition.input_parameters.len(),
            definition.rules.len()
        );

        Ok(definition)
    }
}

/// Load-once cache in front of another rule store
pub struct CachedRuleStore<S = FileRuleStore> {
    inner: S,
    cache: RwLock<HashMap<PathBuf, RuleDefinition>>,
}

impl<S: RuleStore> CachedRuleStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every cached definition
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    /// Number of cached definitions
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Get the wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RuleStore> RuleStore for CachedRuleStore<S> {
    fn load(&self, location: &Path) -> EvalResult<RuleDefinition> {
        if let Some(definition) = self.cache.read().get(location) {
            return Ok(definition.clone());
        }

        // Failed loads are not cached
        let definition = self.inner.load(location)?;
        self.cache
            .write()
            .insert(location.to_path_buf(), definition.clone());
        Ok(definition)
    }
}
