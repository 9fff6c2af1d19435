//! Process-level entry point and plugin factory.
//!
//! A plugin library owns one [`EntryPoint`]. Plugins are registered on it
//! explicitly before the host queries anything; the host then asks for the
//! factory by id, enumerates descriptors and creates instances.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::host::HostCapabilities;
use crate::instance::PluginInstance;
use crate::plugin::Plugin;

/// Id under which [`EntryPoint::factory`] returns the plugin factory.
pub const FACTORY_ID: &str = "plugin-factory";

/// One plugin type offered by the library.
#[derive(Clone, Copy)]
pub struct PluginEntry {
    pub config: &'static Config,
    /// Builds a fresh, unconfigured plugin object.
    pub create: fn() -> Box<dyn Plugin>,
}

impl PluginEntry {
    pub const fn new(config: &'static Config, create: fn() -> Box<dyn Plugin>) -> Self {
        Self { config, create }
    }
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("id", &self.config.id)
            .finish()
    }
}

/// Registration list the host enumerates.
#[derive(Debug, Default)]
pub struct PluginFactory {
    entries: Vec<PluginEntry>,
}

impl PluginFactory {
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Descriptor of the plugin at `index`.
    pub fn descriptor(&self, index: usize) -> Option<&'static Config> {
        self.entries.get(index).map(|entry| entry.config)
    }

    /// Create an uninitialized instance of plugin `id`, or `None` if no
    /// such plugin is registered.
    pub fn create(&self, id: &str, host: Arc<dyn HostCapabilities>) -> Option<PluginInstance> {
        let entry = self.entries.iter().find(|entry| entry.config.id == id)?;
        log::debug!("creating {} for {}", id, host.name());
        Some(PluginInstance::new(entry.config, (entry.create)(), host))
    }
}

/// Library entry point.
#[derive(Debug, Default)]
pub struct EntryPoint {
    factory: PluginFactory,
    plugin_path: Option<PathBuf>,
}

impl EntryPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. An entry with the same id is replaced.
    pub fn register(&mut self, entry: PluginEntry) {
        let entries = &mut self.factory.entries;
        match entries.iter_mut().find(|e| e.config.id == entry.config.id) {
            Some(existing) => {
                log::warn!("plugin '{}' registered twice, replacing", entry.config.id);
                *existing = entry;
            }
            None => entries.push(entry),
        }
    }

    /// Remove every registered plugin.
    pub fn clear(&mut self) {
        self.factory.entries.clear();
    }

    /// Called by the host once after loading the library.
    pub fn init(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        log::debug!("entry point loaded from {}", path.display());
        self.plugin_path = Some(path.to_path_buf());
        true
    }

    /// Called by the host before unloading the library.
    pub fn deinit(&mut self) {
        self.plugin_path = None;
    }

    /// Path given to [`init`](Self::init).
    pub fn plugin_path(&self) -> Option<&Path> {
        self.plugin_path.as_deref()
    }

    /// Factory lookup by id.
    pub fn factory(&self, id: &str) -> Option<&PluginFactory> {
        (id == FACTORY_ID).then_some(&self.factory)
    }
}
