//! Sample-accurate interleaving of events and audio rendering.
//!
//! For each block the scheduler:
//! 1. drains the main→audio parameter channel once,
//! 2. applies every event stamped at the current frame,
//! 3. renders up to the next event's frame (or the end of the block),
//! 4. repeats from the frame it stopped at.
//!
//! Audio is never rendered across an event's timestamp. Host protocol
//! violations (timestamps past the block, or going backwards) are tolerated:
//! late events are clamped to the last frame, out-of-order ones are applied
//! at the current frame, and both are counted. Nothing here logs.

use crate::audio::{AudioBlock, ProcessStatus};
use crate::events::{Event, EventBody, OutputEvents};
use crate::parameter_store::AudioParameters;
use crate::processor::{ProcessContext, Processor};

/// Drives one process call.
#[derive(Debug, Default)]
pub struct EventScheduler {
    protocol_violations: u32,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events whose timestamps had to be corrected since the last
    /// [`take_protocol_violations`](Self::take_protocol_violations).
    pub fn protocol_violations(&self) -> u32 {
        self.protocol_violations
    }

    /// Return and reset the violation count.
    pub fn take_protocol_violations(&mut self) -> u32 {
        std::mem::take(&mut self.protocol_violations)
    }

    /// Process one block.
    pub fn run(
        &mut self,
        processor: &mut dyn Processor,
        params: &mut AudioParameters,
        events: &[Event],
        audio: &mut AudioBlock<'_, '_>,
        out: &mut OutputEvents,
        sample_rate: f64,
    ) -> ProcessStatus {
        params.flush_from_main(out);

        let frame_count = block_frames(audio.frames());
        let mut ctx = ProcessContext {
            params,
            events: out,
            sample_rate,
        };
        let mut status = ProcessStatus::Continue;
        let mut index = 0;
        let mut frame = 0u32;

        loop {
            ctx.events.set_time(frame);
            while let Some(event) = events.get(index) {
                let (time, violated) = effective_time(event.time, frame, frame_count);
                if time != frame {
                    break;
                }
                if violated {
                    self.protocol_violations = self.protocol_violations.saturating_add(1);
                }
                dispatch(processor, &mut ctx, event);
                index += 1;
            }

            if frame >= frame_count {
                break;
            }

            let next = events
                .get(index)
                .map_or(frame_count, |event| effective_time(event.time, frame, frame_count).0);
            ctx.events.set_time(frame);
            status = processor.process_audio(&mut ctx, audio, frame as usize..next as usize);
            frame = next;
        }

        status
    }
}

/// Block length in the event timestamp domain, saturating at `u32::MAX`.
fn block_frames(frames: usize) -> u32 {
    u32::try_from(frames).unwrap_or(u32::MAX)
}

/// Timestamp an event is applied at, and whether it had to be corrected.
fn effective_time(time: u32, frame: u32, frame_count: u32) -> (u32, bool) {
    let last = frame_count.saturating_sub(1);
    if time > last && frame_count > 0 {
        (last.max(frame), true)
    } else if time < frame {
        (frame, true)
    } else if frame_count == 0 {
        (0, time != 0)
    } else {
        (time, false)
    }
}

fn dispatch(processor: &mut dyn Processor, ctx: &mut ProcessContext<'_>, event: &Event) {
    if !ctx.params.handle_event(&event.body) {
        if let Some(voices) = processor.voices() {
            match event.body {
                EventBody::NoteOn { note, velocity } => voices.note_on(note, velocity, ctx.events),
                EventBody::NoteOff { note, .. } => voices.note_off(note, ctx.events),
                EventBody::NoteChoke { note } => voices.note_choke(note, ctx.events),
                EventBody::NoteExpression {
                    note,
                    expression,
                    value,
                } => voices.note_expression(note, expression, value),
                _ => {}
            }
        }
    }
    processor.process_event(event, ctx);
}
