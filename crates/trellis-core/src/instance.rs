//! The host-facing plugin instance.
//!
//! A running plugin is split in two halves that never share mutable data:
//!
//! - [`PluginInstance`] lives on the main thread. It owns the plugin
//!   object, the main-side parameter store, the extension table, timers and
//!   the GUI bridge, and takes every lifecycle call.
//! - [`AudioInstance`] lives on the audio thread while processing. It owns
//!   the audio-side parameter store, the processor, the event scheduler and
//!   the events queued for the next block.
//!
//! `start_processing` moves the audio half out of the instance and
//! `stop_processing` takes it back, so the host can call
//! [`AudioInstance::process`] on one thread while the parameter, state and
//! timer calls keep running on the other. The two halves talk only through
//! the parameter change channels.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::audio::{AudioBlock, ProcessStatus};
use crate::config::Config;
use crate::error::{PluginError, PluginResult};
use crate::events::{Event, OutputEvents};
use crate::extension::{self, Extension, ExtensionRegistry, EXT_GUI, EXT_PARAMS, EXT_STATE, EXT_TIMER};
use crate::gui::GuiBridge;
use crate::host::{HostCapabilities, LogSeverity, PluginHost, TimerId};
use crate::lifecycle::{LifecycleState, Transition};
use crate::parameter_info::{ParameterId, ParameterInfo};
use crate::parameter_store::{parameter_stores, AudioParameters, MainParameters};
use crate::plugin::{MainContext, Plugin, Setup};
use crate::processor::Processor;
use crate::scheduler::EventScheduler;
use crate::state::{self, PresetInfo, StateFormat};

/// Host extensions reported in the support matrix after `init`.
const HOST_EXTENSIONS: &[&str] = &["log", "thread-check", "params", "state", "timer-support", "gui"];

/// The audio-thread half of a plugin instance.
///
/// Handed out by [`PluginInstance::start_processing`] and returned with
/// [`PluginInstance::stop_processing`]. Nothing here allocates, locks or
/// logs once processing has started.
pub struct AudioInstance {
    params: AudioParameters,
    processor: Box<dyn Processor>,
    scheduler: EventScheduler,
    /// Events produced outside `process` (reset, flush), delivered at the
    /// start of the next block.
    pending: OutputEvents,
    sample_rate: f64,
}

impl AudioInstance {
    /// Process one block.
    pub fn process(
        &mut self,
        events: &[Event],
        audio: &mut AudioBlock<'_, '_>,
        out: &mut OutputEvents,
    ) -> ProcessStatus {
        self.deliver_pending(out);
        self.scheduler.run(
            self.processor.as_mut(),
            &mut self.params,
            events,
            audio,
            out,
            self.sample_rate,
        )
    }

    /// Audio-side parameter values.
    pub fn params(&self) -> &AudioParameters {
        &self.params
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Voices currently sounding, or 0 for processors without a pool.
    pub fn active_voice_count(&mut self) -> usize {
        self.processor
            .voices()
            .map_or(0, |voices| voices.active_voice_count())
    }

    fn deliver_pending(&mut self, out: &mut OutputEvents) {
        for event in self.pending.iter() {
            out.push(Event::new(0, event.body));
        }
        self.pending.clear();
    }
}

impl std::fmt::Debug for AudioInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioInstance")
            .field("parameters", &self.params.count())
            .field("sample_rate", &self.sample_rate)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Everything that exists only between a successful `init` and `destroy`.
struct Core {
    main: MainParameters,
    /// `None` while the audio half is out on the audio thread.
    audio: Option<AudioInstance>,
    extensions: ExtensionRegistry,
    state_format: StateFormat,
    preset: Option<PresetInfo>,
    gui: Option<GuiBridge>,
    sample_rate: f64,
    min_frames: u32,
    max_frames: u32,
}

/// The main-thread half of one plugin instance, as driven by the host.
pub struct PluginInstance {
    config: &'static Config,
    plugin: Box<dyn Plugin>,
    host: PluginHost,
    state: LifecycleState,
    core: Option<Core>,
}

impl PluginInstance {
    /// Wrap a plugin object. Nothing is configured until [`init`](Self::init).
    pub fn new(config: &'static Config, plugin: Box<dyn Plugin>, host: Arc<dyn HostCapabilities>) -> Self {
        Self {
            config,
            plugin,
            host: PluginHost::new(host),
            state: LifecycleState::Constructed,
            core: None,
        }
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut PluginHost {
        &mut self.host
    }

    /// Sample rate given to the last `activate`, or 0 before that.
    pub fn sample_rate(&self) -> f64 {
        self.core.as_ref().map_or(0.0, |core| core.sample_rate)
    }

    /// Block size bounds given to the last `activate`.
    pub fn block_size_range(&self) -> (u32, u32) {
        self.core
            .as_ref()
            .map_or((0, 0), |core| (core.min_frames, core.max_frames))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Run the plugin's configuration and validate it.
    ///
    /// A configuration error is logged and leaves the instance `Failed`;
    /// only `destroy` is accepted afterwards.
    pub fn init(&mut self) -> PluginResult<()> {
        let next = self.state.apply(Transition::Init)?;
        let core = match self.configure() {
            Ok(core) => core,
            Err(err) => {
                self.host.log(
                    LogSeverity::Error,
                    &format!("{}: initialization failed: {err}", self.config.id),
                );
                self.state = LifecycleState::Failed;
                return Err(err);
            }
        };
        let core = self.core.insert(core);
        self.state = next;
        self.host.log_support_matrix(HOST_EXTENSIONS);

        let mut ctx = MainContext {
            params: &mut core.main,
            host: &mut self.host,
        };
        self.plugin.on_init(&mut ctx);
        Ok(())
    }

    fn configure(&mut self) -> PluginResult<Core> {
        let mut setup = Setup::new();
        self.plugin.configure(&mut setup)?;
        setup.registry.validate()?;
        let processor = setup
            .processor
            .ok_or_else(|| PluginError::Configuration("no processor attached".into()))?;

        let registry = Arc::new(setup.registry);
        // holds a full state load and a full reset between two blocks
        let capacity = setup.channel_capacity.max(registry.count() * 2);
        log::debug!(
            "{}: {} parameters, {:?} state, {} change slots",
            self.config.id,
            registry.count(),
            setup.state_format,
            capacity
        );
        let (main, params) = parameter_stores(registry, capacity);

        let mut extensions = ExtensionRegistry::new();
        extensions.register(EXT_PARAMS, Extension::Parameters(&extension::PARAMETERS));
        extensions.register(EXT_STATE, Extension::State(&extension::STATE));
        if setup.timers {
            extensions.register(EXT_TIMER, Extension::Timer(&extension::TIMER));
        }
        let gui = if setup.gui {
            extensions.register(EXT_GUI, Extension::Gui(&extension::GUI));
            Some(GuiBridge::new(setup.gui_handler))
        } else {
            None
        };

        Ok(Core {
            main,
            audio: Some(AudioInstance {
                params,
                processor,
                scheduler: EventScheduler::new(),
                pending: OutputEvents::with_capacity(setup.output_capacity),
                sample_rate: 0.0,
            }),
            extensions,
            state_format: setup.state_format,
            preset: setup.preset,
            gui,
            sample_rate: 0.0,
            min_frames: 0,
            max_frames: 0,
        })
    }

    /// Prepare for processing at `sample_rate`.
    pub fn activate(&mut self, sample_rate: f64, min_frames: u32, max_frames: u32) -> PluginResult<()> {
        let next = self.state.apply(Transition::Activate)?;
        let core = self.core.as_mut().ok_or(PluginError::NotInitialized)?;
        let audio = core.audio.as_mut().ok_or(PluginError::NotInitialized)?;
        audio.sample_rate = sample_rate;
        audio.processor.activate(sample_rate, min_frames, max_frames);
        core.sample_rate = sample_rate;
        core.min_frames = min_frames;
        core.max_frames = max_frames;
        self.state = next;
        Ok(())
    }

    /// Release sample-rate dependent resources.
    pub fn deactivate(&mut self) -> PluginResult<()> {
        let next = self.state.apply(Transition::Deactivate)?;
        let core = self.core.as_mut().ok_or(PluginError::NotInitialized)?;
        let audio = core.audio.as_mut().ok_or(PluginError::NotInitialized)?;
        audio.processor.deactivate();
        self.state = next;
        Ok(())
    }

    /// Enter the processing bracket and hand out the audio half.
    ///
    /// The returned [`AudioInstance`] may be moved to the audio thread; it
    /// must come back through [`stop_processing`](Self::stop_processing).
    pub fn start_processing(&mut self) -> PluginResult<AudioInstance> {
        let next = self.state.apply(Transition::StartProcessing)?;
        let core = self.core.as_mut().ok_or(PluginError::NotInitialized)?;
        let audio = core.audio.take().ok_or(PluginError::NotInitialized)?;
        self.state = next;
        Ok(audio)
    }

    /// Take the audio half back, leave the processing bracket and report
    /// host protocol violations seen since `start_processing`.
    pub fn stop_processing(&mut self, mut audio: AudioInstance) -> PluginResult<()> {
        let next = self.state.apply(Transition::StopProcessing)?;
        let core = self.core.as_mut().ok_or(PluginError::NotInitialized)?;
        if !Arc::ptr_eq(audio.params.registry(), core.main.registry()) {
            return Err(PluginError::ForeignAudioInstance);
        }
        let violations = audio.scheduler.take_protocol_violations();
        core.audio = Some(audio);
        if violations > 0 {
            self.host.log(
                LogSeverity::Warning,
                &format!("host sent {violations} events with out-of-range or out-of-order timestamps"),
            );
        }
        self.state = next;
        Ok(())
    }

    /// Choke every voice and clear transient DSP state without leaving
    /// `Active`. The note-end events are delivered with the next block.
    pub fn reset(&mut self) -> PluginResult<()> {
        let next = self.state.apply(Transition::Reset)?;
        let core = self.core.as_mut().ok_or(PluginError::NotInitialized)?;
        let audio = core.audio.as_mut().ok_or(PluginError::NotInitialized)?;
        if let Some(voices) = audio.processor.voices() {
            voices.choke_all(&mut audio.pending);
        }
        audio.processor.reset();
        audio.params.clear_modulations();
        self.state = next;
        Ok(())
    }

    /// Release everything. The instance is unusable afterwards.
    pub fn destroy(&mut self) -> PluginResult<()> {
        let next = self.state.apply(Transition::Destroy)?;
        self.host.cancel_all_timers();
        self.core = None;
        self.state = next;
        Ok(())
    }

    /// Dispatch record for a named extension. `None` before `init`.
    pub fn get_extension(&self, name: &str) -> Option<Extension> {
        self.core.as_ref()?.extensions.get(name)
    }

    /// Voices currently sounding. 0 while the audio half is out processing,
    /// and for processors without a pool.
    pub fn active_voice_count(&mut self) -> usize {
        self.core
            .as_mut()
            .and_then(|core| core.audio.as_mut())
            .map_or(0, AudioInstance::active_voice_count)
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    pub fn parameter_count(&self) -> usize {
        self.core.as_ref().map_or(0, |core| core.main.count())
    }

    /// Host-facing info for the parameter at `index`.
    pub fn parameter_info(&self, index: usize) -> Option<ParameterInfo> {
        let core = self.core.as_ref()?;
        core.main.registry().by_index(index).map(|descriptor| descriptor.info())
    }

    /// Current raw value. Unknown ids read as 0.
    pub fn get_value(&mut self, id: ParameterId) -> f64 {
        self.core.as_mut().map_or(0.0, |core| core.main.get(id))
    }

    /// Set a raw value from the main thread. Unknown ids are ignored.
    pub fn set_value(&mut self, id: ParameterId, value: f64) {
        if let Some(core) = self.core.as_mut() {
            core.main.set(id, value);
        }
    }

    pub fn value_to_text(&self, id: ParameterId, value: f64) -> Option<String> {
        self.core.as_ref()?.main.registry().value_to_text(id, value)
    }

    pub fn text_to_value(&self, id: ParameterId, text: &str) -> Option<f64> {
        self.core.as_ref()?.main.registry().text_to_value(id, text)
    }

    /// Parameter flush requested by the host while not processing.
    ///
    /// Drains main→audio as a block would, then applies the host's
    /// parameter events. Queued reset events are delivered too. While the
    /// audio half is out processing, the next block does this instead.
    pub fn flush_parameters(&mut self, events: &[Event], out: &mut OutputEvents) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        let Some(audio) = core.audio.as_mut() else {
            log::debug!("parameter flush ignored while processing");
            return;
        };
        audio.deliver_pending(out);
        out.set_time(0);
        audio.params.flush_from_main(out);
        for event in events {
            audio.params.handle_event(&event.body);
        }
    }

    pub fn reset_all_to_default(&mut self) {
        if let Some(core) = self.core.as_mut() {
            core.main.reset_all_to_default();
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Write the current parameter values in the configured format.
    pub fn save_state(&mut self, writer: &mut dyn Write) -> PluginResult<()> {
        let core = self.core.as_mut().ok_or(PluginError::NotInitialized)?;
        core.main.flush_from_audio();
        match core.state_format {
            StateFormat::Binary => state::save_binary(&core.main, writer)?,
            StateFormat::Toml { version } => {
                state::save_toml(&core.main, self.config.id, version, core.preset.as_ref(), writer)?
            }
        }
        Ok(())
    }

    /// Restore parameter values saved by [`save_state`](Self::save_state).
    ///
    /// On failure values applied before the error stay in place.
    pub fn load_state(&mut self, reader: &mut dyn Read) -> PluginResult<()> {
        let core = self.core.as_mut().ok_or(PluginError::NotInitialized)?;
        core.main.flush_from_audio();
        match core.state_format {
            StateFormat::Binary => state::load_binary(&mut core.main, reader)?,
            StateFormat::Toml { version } => {
                let plugin = &mut self.plugin;
                let mut migrate = |document: &mut toml::Table, from: u32| -> Result<(), String> {
                    plugin.migrate_state(document, from, version)
                };
                let report = state::load_toml(&mut core.main, self.config.id, version, reader, &mut migrate)?;
                if !report.skipped_keys.is_empty() {
                    self.host.log(
                        LogSeverity::Warning,
                        &format!("ignored state keys: {}", report.skipped_keys.join(", ")),
                    );
                }
                if report.preset.is_some() {
                    core.preset = report.preset;
                }
            }
        }
        Ok(())
    }

    /// Preset metadata from setup or the last TOML load.
    pub fn preset(&self) -> Option<&PresetInfo> {
        self.core.as_ref()?.preset.as_ref()
    }

    // =========================================================================
    // Main-thread callbacks
    // =========================================================================

    /// A host timer fired. Ids that were cancelled are ignored.
    pub fn on_timer(&mut self, id: TimerId) {
        let Some(tag) = self.host.timer_tag(id) else {
            log::debug!("timer {id} fired after cancellation");
            return;
        };
        let Some(core) = self.core.as_mut() else {
            return;
        };
        core.main.resend_dropped();
        let mut ctx = MainContext {
            params: &mut core.main,
            host: &mut self.host,
        };
        self.plugin.on_timer(tag, &mut ctx);
    }

    /// The host answered a `request_callback`.
    pub fn on_main_thread(&mut self) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        core.main.resend_dropped();
        let mut ctx = MainContext {
            params: &mut core.main,
            host: &mut self.host,
        };
        self.plugin.on_main_thread(&mut ctx);
    }

    // =========================================================================
    // GUI bridge
    // =========================================================================

    pub fn gui_parameters_json(&mut self) -> Option<String> {
        let core = self.core.as_mut()?;
        let gui = core.gui.as_mut()?;
        Some(gui.parameters_json(&mut core.main))
    }

    pub fn gui_handle_message(&mut self, message: &str) -> Option<String> {
        let core = self.core.as_mut()?;
        let gui = core.gui.as_mut()?;
        gui.handle_message(&mut core.main, message)
    }

    pub fn gui_changed_since_last_poll(&mut self) -> Option<String> {
        let core = self.core.as_mut()?;
        let gui = core.gui.as_mut()?;
        Some(gui.changed_since_last_poll(&mut core.main))
    }
}

impl Drop for PluginInstance {
    fn drop(&mut self) {
        self.host.cancel_all_timers();
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("id", &self.config.id)
            .field("state", &self.state)
            .field("parameters", &self.parameter_count())
            .finish()
    }
}
