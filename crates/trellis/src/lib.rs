//! # Trellis
//!
//! Audio plugin runtime framework for Rust.
//!
//! Trellis gives a plugin a checked lifecycle, sample-accurate event
//! handling, lock-free parameter sync between the main and audio threads
//! and a polyphonic voice allocator. Format bindings sit on top of
//! [`core::PluginInstance`] and [`core::EntryPoint`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! static CONFIG: Config = Config::new("com.example.gain", "Gain", Category::Effect);
//!
//! struct GainProcessor;
//!
//! impl Processor for GainProcessor {
//!     fn process_audio(&mut self, ctx: &mut ProcessContext<'_>, audio: &mut AudioBlock<'_, '_>, range: Range<usize>) -> ProcessStatus {
//!         let gain = ctx.params.plain(0) as f32;
//!         audio.pass_through(range.clone());
//!         // scale outputs by gain ...
//!         ProcessStatus::Continue
//!     }
//! }
//!
//! struct Gain;
//!
//! impl Plugin for Gain {
//!     fn configure(&mut self, setup: &mut Setup) -> PluginResult<()> {
//!         setup.parameter_count(1)?;
//!         setup.parameter(0, ParameterDescriptor::decibels("gain", "Gain", -60.0, 12.0, 0.0))?;
//!         setup.processor(GainProcessor);
//!         Ok(())
//!     }
//! }
//!
//! let mut entry = EntryPoint::new();
//! entry.register(PluginEntry::new(&CONFIG, || Box::new(Gain)));
//! ```

// Re-export sub-crates
pub use trellis_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use std::ops::Range;

    pub use trellis_core::{
        // Audio
        AudioBlock, ProcessStatus,
        // Plugin description
        Category, Config, Feature,
        // Entry point
        AudioInstance, EntryPoint, PluginEntry, PluginInstance,
        // Errors
        PluginError, PluginResult, StateError,
        // Events
        Event, EventBody, NoteExpression, NoteId, OutputEvents,
        // Host services
        HostCapabilities, LogSeverity, PluginHost, TimerId, TimerTag,
        // Parameters
        AudioParameters, Curve, Formatter, MainParameters, ParameterDescriptor, ParameterFlags,
        ParameterId,
        // Plugin traits
        GuiHandler, MainContext, Plugin, ProcessContext, Processor, Setup,
        // State
        PresetInfo, StateFormat,
        // Voices
        Voice, VoiceContext, VoiceControl, VoicePool, VoiceStrategy,
    };
}
