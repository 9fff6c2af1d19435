//! The plugin author's side of the contract.
//!
//! A plugin is a main-thread object implementing [`Plugin`]. During `init`
//! it receives a [`Setup`] in which it registers its parameters, attaches
//! its [`Processor`](crate::Processor) and opts into optional features.
//! Afterwards it is only called back on the main thread through
//! [`MainContext`].

use crate::channel::DEFAULT_CAPACITY;
use crate::error::PluginResult;
use crate::events::OutputEvents;
use crate::gui::GuiHandler;
use crate::host::{PluginHost, TimerTag};
use crate::parameter_info::{ParameterDescriptor, ParameterId};
use crate::parameter_registry::ParameterRegistry;
use crate::parameter_store::MainParameters;
use crate::processor::Processor;
use crate::state::{PresetInfo, StateFormat};

/// Main-thread half of a plugin.
pub trait Plugin: Send {
    /// Declare parameters, attach the processor and pick features.
    fn configure(&mut self, setup: &mut Setup) -> PluginResult<()>;

    /// Called once after configuration succeeded, e.g. to start timers.
    fn on_init(&mut self, ctx: &mut MainContext<'_>) {
        let _ = ctx;
    }

    /// A timer registered with [`PluginHost::add_timer`] fired.
    fn on_timer(&mut self, tag: TimerTag, ctx: &mut MainContext<'_>) {
        let _ = (tag, ctx);
    }

    /// The host answered [`PluginHost::request_callback`].
    fn on_main_thread(&mut self, ctx: &mut MainContext<'_>) {
        let _ = ctx;
    }

    /// Upgrade a TOML state document written with version `from`.
    fn migrate_state(&mut self, document: &mut toml::Table, from: u32, to: u32) -> Result<(), String> {
        let _ = document;
        Err(format!("no migration from state version {from} to {to}"))
    }
}

/// Main-thread services available to plugin callbacks.
pub struct MainContext<'a> {
    pub params: &'a mut MainParameters,
    pub host: &'a mut PluginHost,
}

/// Per-instance configuration collected from [`Plugin::configure`].
pub struct Setup {
    pub(crate) registry: ParameterRegistry,
    pub(crate) processor: Option<Box<dyn Processor>>,
    pub(crate) state_format: StateFormat,
    pub(crate) channel_capacity: usize,
    pub(crate) output_capacity: usize,
    pub(crate) timers: bool,
    pub(crate) gui: bool,
    pub(crate) gui_handler: Option<Box<dyn GuiHandler>>,
    pub(crate) preset: Option<PresetInfo>,
}

impl Setup {
    pub(crate) fn new() -> Self {
        Self {
            registry: ParameterRegistry::new(0),
            processor: None,
            state_format: StateFormat::default(),
            channel_capacity: DEFAULT_CAPACITY,
            output_capacity: OutputEvents::DEFAULT_CAPACITY,
            timers: false,
            gui: false,
            gui_handler: None,
            preset: None,
        }
    }

    /// Declare how many parameters the plugin has. Every id below `count`
    /// must be registered before `configure` returns.
    pub fn parameter_count(&mut self, count: usize) -> PluginResult<()> {
        self.registry.set_count(count)
    }

    /// Register a parameter in slot `id`.
    pub fn parameter(&mut self, id: ParameterId, descriptor: ParameterDescriptor) -> PluginResult<()> {
        self.registry.configure(id, descriptor)
    }

    /// Parameters registered so far.
    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Attach the DSP processor. Required.
    pub fn processor(&mut self, processor: impl Processor + 'static) {
        self.processor = Some(Box::new(processor));
    }

    /// Choose the persisted state format. Binary by default.
    pub fn state_format(&mut self, format: StateFormat) {
        self.state_format = format;
    }

    /// Records per direction in the parameter change channels. `init`
    /// raises it to at least twice the parameter count.
    pub fn channel_capacity(&mut self, capacity: usize) {
        self.channel_capacity = capacity.max(1);
    }

    /// Events the plugin may queue between process calls (reset, flush).
    pub fn output_event_capacity(&mut self, capacity: usize) {
        self.output_capacity = capacity;
    }

    /// Expose the timer extension.
    pub fn enable_timers(&mut self) {
        self.timers = true;
    }

    /// Expose the GUI bridge, optionally with a custom message handler.
    pub fn enable_gui(&mut self, handler: Option<Box<dyn GuiHandler>>) {
        self.gui = true;
        self.gui_handler = handler;
    }

    /// Preset metadata written with TOML state.
    pub fn preset(&mut self, preset: PresetInfo) {
        self.preset = Some(preset);
    }
}
