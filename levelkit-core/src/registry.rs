//! Template registry
//!
//! Maps logic keys to loaded templates. The map is built from a content
//! source on first use and rebuilt only on an explicit refresh.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock};

use crate::codec::AssetLookup;
use crate::content::{BuiltinContent, ContentError, ContentSource, SkippedTemplate};
use crate::types::ObjectTemplate;

/// Two templates claimed the same logic key; the first one was kept
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Duplicate logic key '{logic_key}': keeping '{kept}', ignoring '{ignored}'")]
pub struct DuplicateKeyWarning {
    pub logic_key: String,
    pub kept: String,
    pub ignored: String,
}

#[derive(Debug, Default)]
struct RegistryState {
    initialized: bool,
    templates: BTreeMap<String, Arc<ObjectTemplate>>,
    /// Registration order, for listing
    order: Vec<String>,
    assets: HashSet<String>,
    warnings: Vec<DuplicateKeyWarning>,
    skipped: Vec<SkippedTemplate>,
}

impl RegistryState {
    fn rebuild(source: &dyn ContentSource) -> Result<Self, ContentError> {
        let mut state = RegistryState::default();
        let scan = source.scan()?;
        state.skipped = scan.skipped;

        for template in scan.templates {
            if template.logic_key.trim().is_empty() {
                tracing::warn!("Skipping template '{}' with an empty logic key", template.name);
                continue;
            }

            if let Some(existing) = state.templates.get(&template.logic_key) {
                let warning = DuplicateKeyWarning {
                    logic_key: template.logic_key.clone(),
                    kept: existing.name.clone(),
                    ignored: template.name.clone(),
                };
                tracing::warn!("{}", warning);
                state.warnings.push(warning);
                continue;
            }

            state.order.push(template.logic_key.clone());
            state
                .templates
                .insert(template.logic_key.clone(), Arc::new(template));
        }

        state.assets = source.assets().into_iter().collect();
        state.initialized = true;
        Ok(state)
    }
}

/// Logic key to template lookup
pub struct TemplateRegistry {
    source: Box<dyn ContentSource + Send + Sync>,
    state: Mutex<RegistryState>,
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TemplateRegistry")
            .field("initialized", &state.initialized)
            .field("templates", &state.templates.len())
            .finish()
    }
}

impl TemplateRegistry {
    pub fn new<S: ContentSource + Send + Sync + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Process-wide registry over the built-in catalogue
    pub fn global() -> &'static TemplateRegistry {
        static REGISTRY: OnceLock<TemplateRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| TemplateRegistry::new(BuiltinContent))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Scan the content source if that has not happened yet.
    ///
    /// A failed scan leaves the registry uninitialized, so the next call
    /// retries.
    pub fn initialize(&self) -> Result<(), ContentError> {
        let mut state = self.lock();
        if state.initialized {
            return Ok(());
        }
        self.scan(&mut state)
    }

    fn scan(&self, state: &mut RegistryState) -> Result<(), ContentError> {
        *state = RegistryState::rebuild(self.source.as_ref())?;
        tracing::info!(
            "Template registry loaded {} templates, {} assets ({} files skipped)",
            state.templates.len(),
            state.assets.len(),
            state.skipped.len()
        );
        Ok(())
    }

    /// Discard the current map and rescan the content source
    pub fn force_refresh(&self) -> Result<(), ContentError> {
        let mut state = self.lock();
        *state = RegistryState::default();
        self.scan(&mut state)
    }

    /// Template for `logic_key`, initializing lazily.
    ///
    /// An empty key resolves to nothing without touching the content source.
    pub fn resolve(&self, logic_key: &str) -> Option<Arc<ObjectTemplate>> {
        if logic_key.is_empty() {
            return None;
        }

        self.loaded()?.templates.get(logic_key).cloned()
    }

    /// Locked state, scanning first if needed; `None` when the scan fails
    fn loaded(&self) -> Option<std::sync::MutexGuard<'_, RegistryState>> {
        let mut state = self.lock();
        if !state.initialized {
            if let Err(e) = self.scan(&mut state) {
                tracing::warn!("Failed to load templates: {}", e);
                return None;
            }
        }
        Some(state)
    }

    /// Collisions seen during the last scan
    pub fn duplicate_warnings(&self) -> Vec<DuplicateKeyWarning> {
        self.lock().warnings.clone()
    }

    /// Template files the last scan could not parse
    pub fn skipped_templates(&self) -> Vec<SkippedTemplate> {
        self.lock().skipped.clone()
    }

    /// Registered templates in registration order
    pub fn templates(&self) -> Vec<Arc<ObjectTemplate>> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|key| state.templates.get(key).cloned())
            .collect()
    }

    /// Registered logic keys, sorted
    pub fn logic_keys(&self) -> Vec<String> {
        self.lock().templates.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Whether the content source knows asset `name`, initializing lazily
    pub fn contains_asset(&self, name: &str) -> bool {
        self.loaded().is_some_and(|state| state.assets.contains(name))
    }
}

impl AssetLookup for TemplateRegistry {
    fn contains_asset(&self, name: &str) -> bool {
        TemplateRegistry::contains_asset(self, name)
    }
}
