//! Audio-thread half of a plugin.
//!
//! A [`Processor`] is created by the plugin during configuration and moved
//! behind the instance. Every method except `activate`/`deactivate` runs on
//! the audio thread and must not allocate, lock or block.

use std::ops::Range;

use crate::audio::{AudioBlock, ProcessStatus};
use crate::events::{Event, EventBody, OutputEvents};
use crate::parameter_store::AudioParameters;
use crate::voice::{VoiceContext, VoiceControl, VoicePool, Voice};

/// Per-block context handed to the processor.
pub struct ProcessContext<'a> {
    /// Audio-side parameter values.
    pub params: &'a mut AudioParameters,
    /// Events for the host. `push_now` stamps the current frame.
    pub events: &'a mut OutputEvents,
    /// Sample rate given at activation.
    pub sample_rate: f64,
}

impl ProcessContext<'_> {
    /// Send an event to the host at the current frame.
    pub fn send(&mut self, body: EventBody) -> bool {
        self.events.push_now(body)
    }
}

/// DSP side of a plugin.
pub trait Processor: Send {
    /// Allocate sample-rate dependent resources. Main thread, not processing.
    fn activate(&mut self, sample_rate: f64, min_frames: u32, max_frames: u32) {
        let _ = (sample_rate, min_frames, max_frames);
    }

    /// Release sample-rate dependent resources. Main thread.
    fn deactivate(&mut self) {}

    /// Clear transient DSP state (delay lines, phases, envelopes).
    fn reset(&mut self) {}

    /// Called for every incoming event after parameter and voice routing.
    fn process_event(&mut self, event: &Event, ctx: &mut ProcessContext<'_>) {
        let _ = (event, ctx);
    }

    /// Render `range` of the block. Called once per span between events.
    fn process_audio(
        &mut self,
        ctx: &mut ProcessContext<'_>,
        audio: &mut AudioBlock<'_, '_>,
        range: Range<usize>,
    ) -> ProcessStatus;

    /// Voice pool that should receive note events, if any.
    fn voices(&mut self) -> Option<&mut dyn VoiceControl> {
        None
    }
}

impl<V: Voice> VoicePool<V> {
    /// Render with the parameters and event list of a [`ProcessContext`].
    pub fn process(
        &mut self,
        ctx: &mut ProcessContext<'_>,
        audio: &mut AudioBlock<'_, '_>,
        range: Range<usize>,
    ) -> ProcessStatus {
        let voice_ctx = VoiceContext {
            params: &*ctx.params,
            sample_rate: ctx.sample_rate,
        };
        self.render(&voice_ctx, audio, range, &mut *ctx.events)
    }
}
