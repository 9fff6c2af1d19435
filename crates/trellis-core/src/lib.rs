//! # trellis-core
//!
//! Runtime core of the Trellis audio plugin framework.
//!
//! Turns a host's callback-driven plugin interface into a stateful object
//! with a checked lifecycle, sample-accurate event/audio interleaving, a
//! lock-free parameter protocol between the main and audio threads, and a
//! polyphonic voice allocator.
//!
//! ## Architecture
//!
//! ```text
//! EntryPoint ─▶ PluginFactory ─▶ PluginInstance ──start_processing──▶ AudioInstance
//!
//!          main thread                            audio thread
//!   ┌───────────────────┐                 ┌────────────────────────────┐
//!   │ Plugin            │                 │ EventScheduler             │
//!   │ MainParameters ◀──┼──── channels ──▶│ AudioParameters            │
//!   │ PluginHost/timers │                 │ Processor ─▶ VoicePool     │
//!   └───────────────────┘                 └────────────────────────────┘
//! ```
//!
//! A plugin implements [`Plugin`] (configuration and main-thread
//! callbacks) and hands a [`Processor`] to [`Setup::processor`]. The host
//! side drives [`PluginInstance`] through its lifecycle calls and the
//! extension records from [`PluginInstance::get_extension`], and calls
//! [`AudioInstance::process`] on the audio thread between
//! `start_processing` and `stop_processing`.

pub mod audio;
pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod extension;
pub mod factory;
pub mod gui;
pub mod host;
pub mod instance;
pub mod lifecycle;
pub mod note;
pub mod parameter_format;
pub mod parameter_info;
pub mod parameter_range;
pub mod parameter_registry;
pub mod parameter_store;
pub mod plugin;
pub mod processor;
pub mod scheduler;
pub mod state;
pub mod voice;

pub use audio::{AudioBlock, ProcessStatus};
pub use channel::{ChangeKind, ChangeReceiver, ChangeRecord, ChangeSender};
pub use config::{Category, Config, Feature};
pub use error::{PluginError, PluginResult, StateError};
pub use events::{Event, EventBody, NoteExpression, OutputEvents};
pub use extension::{Extension, ExtensionRegistry};
pub use factory::{EntryPoint, PluginEntry, PluginFactory, FACTORY_ID};
pub use gui::{GuiBridge, GuiHandler};
pub use host::{HostCapabilities, LogSeverity, NullHost, PluginHost, TimerId, TimerTag};
pub use instance::{AudioInstance, PluginInstance};
pub use lifecycle::{LifecycleState, Transition};
pub use note::NoteId;
pub use parameter_format::Formatter;
pub use parameter_info::{ParameterDescriptor, ParameterFlags, ParameterId, ParameterInfo, ParameterKind};
pub use parameter_range::Curve;
pub use parameter_registry::ParameterRegistry;
pub use parameter_store::{parameter_stores, AudioParameters, MainParameters};
pub use plugin::{MainContext, Plugin, Setup};
pub use processor::{ProcessContext, Processor};
pub use scheduler::EventScheduler;
pub use state::{PresetInfo, StateFormat};
pub use voice::{Voice, VoiceContext, VoiceControl, VoicePool, VoiceStrategy};
