//! Extension lookup by name.
//!
//! The host asks an instance for a capability by name and receives a fixed
//! dispatch record of function pointers taking the instance. The set of
//! records is closed; which ones an instance exposes is decided during
//! `init` from the plugin's [`Setup`](crate::Setup).

use std::io::{Read, Write};

use crate::error::PluginResult;
use crate::events::{Event, OutputEvents};
use crate::host::TimerId;
use crate::instance::PluginInstance;
use crate::parameter_info::{ParameterId, ParameterInfo};

pub const EXT_PARAMS: &str = "params";
pub const EXT_STATE: &str = "state";
pub const EXT_TIMER: &str = "timer-support";
pub const EXT_GUI: &str = "gui";

/// Parameter queries and the out-of-process flush.
#[derive(Clone, Copy)]
pub struct ParametersExtension {
    pub count: fn(&PluginInstance) -> usize,
    pub get_info: fn(&PluginInstance, usize) -> Option<ParameterInfo>,
    pub get_value: fn(&mut PluginInstance, ParameterId) -> f64,
    pub value_to_text: fn(&PluginInstance, ParameterId, f64) -> Option<String>,
    pub text_to_value: fn(&PluginInstance, ParameterId, &str) -> Option<f64>,
    pub flush: fn(&mut PluginInstance, &[Event], &mut OutputEvents),
    pub reset_all_to_default: fn(&mut PluginInstance),
}

/// Persisted state save/load.
#[derive(Clone, Copy)]
pub struct StateExtension {
    pub save: fn(&mut PluginInstance, &mut dyn Write) -> PluginResult<()>,
    pub load: fn(&mut PluginInstance, &mut dyn Read) -> PluginResult<()>,
}

/// Host-driven timers.
#[derive(Clone, Copy)]
pub struct TimerExtension {
    pub on_timer: fn(&mut PluginInstance, TimerId),
}

/// JSON UI bridge.
#[derive(Clone, Copy)]
pub struct GuiExtension {
    pub parameters_json: fn(&mut PluginInstance) -> Option<String>,
    pub handle_message: fn(&mut PluginInstance, &str) -> Option<String>,
    pub changed_since_last_poll: fn(&mut PluginInstance) -> Option<String>,
}

pub static PARAMETERS: ParametersExtension = ParametersExtension {
    count: PluginInstance::parameter_count,
    get_info: PluginInstance::parameter_info,
    get_value: PluginInstance::get_value,
    value_to_text: PluginInstance::value_to_text,
    text_to_value: PluginInstance::text_to_value,
    flush: PluginInstance::flush_parameters,
    reset_all_to_default: PluginInstance::reset_all_to_default,
};

pub static STATE: StateExtension = StateExtension {
    save: PluginInstance::save_state,
    load: PluginInstance::load_state,
};

pub static TIMER: TimerExtension = TimerExtension {
    on_timer: PluginInstance::on_timer,
};

pub static GUI: GuiExtension = GuiExtension {
    parameters_json: PluginInstance::gui_parameters_json,
    handle_message: PluginInstance::gui_handle_message,
    changed_since_last_poll: PluginInstance::gui_changed_since_last_poll,
};

/// A dispatch record returned by an extension query.
#[derive(Clone, Copy)]
pub enum Extension {
    Parameters(&'static ParametersExtension),
    State(&'static StateExtension),
    Timer(&'static TimerExtension),
    Gui(&'static GuiExtension),
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Extension::Parameters(_) => "Parameters",
            Extension::State(_) => "State",
            Extension::Timer(_) => "Timer",
            Extension::Gui(_) => "Gui",
        };
        f.write_str(name)
    }
}

/// Name → dispatch record table of one instance.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    entries: Vec<(&'static str, Extension)>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the record for `name`.
    pub fn register(&mut self, name: &'static str, extension: Extension) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = extension,
            None => self.entries.push((name, extension)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Extension> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, extension)| *extension)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
