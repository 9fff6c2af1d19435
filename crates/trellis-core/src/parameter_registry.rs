//! Parameter registry.
//!
//! Holds one [`ParameterDescriptor`] per declared parameter id. The plugin
//! declares the parameter count up front and fills every slot during
//! configuration; [`ParameterRegistry::validate`] then checks that no slot
//! was left empty and the registry is frozen. After that it is shared
//! read-only (`Arc<ParameterRegistry>`) between the main and audio sides.

use std::collections::HashMap;

use crate::error::{PluginError, PluginResult};
use crate::parameter_info::{ParameterDescriptor, ParameterId};

/// Static-after-configuration table of parameter descriptors.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    slots: Vec<Option<ParameterDescriptor>>,
    keys: HashMap<String, ParameterId>,
    frozen: bool,
}

impl ParameterRegistry {
    /// Create a registry with `count` empty slots.
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
            keys: HashMap::with_capacity(count),
            frozen: false,
        }
    }

    /// Change the declared parameter count. Existing registrations beyond
    /// the new count are discarded.
    pub fn set_count(&mut self, count: usize) -> PluginResult<()> {
        self.check_not_frozen()?;
        for dropped in self.slots.drain(count.min(self.slots.len())..).flatten() {
            self.keys.remove(&dropped.key);
        }
        self.slots.resize(count, None);
        Ok(())
    }

    /// Register `descriptor` in slot `id`.
    pub fn configure(&mut self, id: ParameterId, mut descriptor: ParameterDescriptor) -> PluginResult<()> {
        self.check_not_frozen()?;
        descriptor.check().map_err(|msg| {
            PluginError::Configuration(format!("parameter '{}': {msg}", descriptor.key))
        })?;
        let count = self.slots.len();
        let slot = self.slots.get_mut(id as usize).ok_or_else(|| {
            PluginError::Configuration(format!(
                "parameter id {id} is out of range (declared {count})"
            ))
        })?;
        if slot.is_some() {
            return Err(PluginError::Configuration(format!(
                "parameter id {id} is registered twice"
            )));
        }
        if let Some(other) = self.keys.get(&descriptor.key) {
            return Err(PluginError::Configuration(format!(
                "parameter key '{}' is used by ids {other} and {id}",
                descriptor.key
            )));
        }
        descriptor.id = id;
        self.keys.insert(descriptor.key.clone(), id);
        *slot = Some(descriptor);
        Ok(())
    }

    /// Check that every declared slot is filled, then freeze the registry.
    pub fn validate(&mut self) -> PluginResult<()> {
        let missing: Vec<String> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(id, _)| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PluginError::Configuration(format!(
                "parameters not registered: {}",
                missing.join(", ")
            )));
        }
        self.frozen = true;
        Ok(())
    }

    /// Whether [`validate`](Self::validate) has succeeded.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_not_frozen(&self) -> PluginResult<()> {
        if self.frozen {
            return Err(PluginError::Configuration(
                "parameters cannot be configured after initialization".into(),
            ));
        }
        Ok(())
    }

    /// Number of declared parameters.
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Descriptor for `id`, or `None` if unknown or unregistered.
    pub fn get(&self, id: ParameterId) -> Option<&ParameterDescriptor> {
        self.slots.get(id as usize).and_then(Option::as_ref)
    }

    /// Descriptor at position `index` (equal to its id).
    pub fn by_index(&self, index: usize) -> Option<&ParameterDescriptor> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Id registered under `key`.
    pub fn id_for_key(&self, key: &str) -> Option<ParameterId> {
        self.keys.get(key).copied()
    }

    /// Registered descriptors in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.slots.iter().flatten()
    }

    /// Raw default of every slot, indexed by id. Empty slots default to 0.0.
    pub fn default_values(&self) -> Vec<f64> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().map_or(0.0, ParameterDescriptor::raw_default))
            .collect()
    }

    /// Host text for a raw value of `id`.
    pub fn value_to_text(&self, id: ParameterId, raw: f64) -> Option<String> {
        self.get(id).map(|desc| desc.value_to_text(raw))
    }

    /// Parse host text into a raw value of `id`.
    pub fn text_to_value(&self, id: ParameterId, text: &str) -> Option<f64> {
        self.get(id).and_then(|desc| desc.text_to_value(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ParameterRegistry {
        let mut registry = ParameterRegistry::new(2);
        registry
            .configure(0, ParameterDescriptor::percent("mix", "Mix", 0.25))
            .unwrap();
        registry
            .configure(1, ParameterDescriptor::integer("voices", "Voices", 1, 8, 4))
            .unwrap();
        registry
    }

    #[test]
    fn test_configure_and_lookup() {
        let mut registry = registry();
        registry.validate().unwrap();
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.id_for_key("voices"), Some(1));
        assert_eq!(registry.get(1).unwrap().id, 1);
        assert_eq!(registry.default_values(), vec![0.25, 4.0]);
        assert_eq!(registry.value_to_text(0, 0.25).as_deref(), Some("25.00%"));
        assert_eq!(registry.get(7), None);
        assert_eq!(registry.value_to_text(7, 0.0), None);
    }

    #[test]
    fn test_missing_slot_fails_validation() {
        let mut registry = ParameterRegistry::new(3);
        registry
            .configure(1, ParameterDescriptor::numeric("a", "A", 0.0, 1.0, 0.0))
            .unwrap();
        let err = registry.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: parameters not registered: 0, 2"
        );
        assert!(!registry.is_frozen());
    }

    #[test]
    fn test_rejects_bad_registrations() {
        let mut registry = registry();
        assert!(registry
            .configure(2, ParameterDescriptor::on_off("x", "X", false))
            .is_err());
        assert!(registry
            .configure(1, ParameterDescriptor::on_off("x", "X", false))
            .is_err());

        let mut registry = ParameterRegistry::new(2);
        registry
            .configure(0, ParameterDescriptor::on_off("x", "X", false))
            .unwrap();
        assert!(registry
            .configure(1, ParameterDescriptor::on_off("x", "Y", false))
            .is_err());
    }

    #[test]
    fn test_rejects_unusable_ranges() {
        let mut registry = ParameterRegistry::new(1);
        let err = registry
            .configure(0, ParameterDescriptor::integer("n", "N", 8, 1, 4))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: parameter 'n': minimum 8 is above maximum 1"
        );
        assert!(registry
            .configure(0, ParameterDescriptor::numeric("x", "X", f64::NAN, 1.0, 0.0))
            .is_err());
        assert!(registry
            .configure(0, ParameterDescriptor::numeric("x", "X", 0.0, 1.0, f64::INFINITY))
            .is_err());
        let no_labels: [&str; 0] = [];
        assert!(registry
            .configure(0, ParameterDescriptor::enumerated("e", "E", &no_labels, 0))
            .is_err());
        assert!(registry.by_index(0).is_none());
    }

    #[test]
    fn test_frozen_after_validate() {
        let mut registry = registry();
        registry.validate().unwrap();
        assert!(registry.set_count(3).is_err());
        assert!(registry
            .configure(0, ParameterDescriptor::on_off("y", "Y", false))
            .is_err());
    }

    #[test]
    fn test_set_count_drops_keys() {
        let mut registry = registry();
        registry.set_count(1).unwrap();
        assert_eq!(registry.id_for_key("voices"), None);
        assert_eq!(registry.count(), 1);
    }
}
