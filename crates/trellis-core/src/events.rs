//! Timed events exchanged with the host.
//!
//! Incoming events arrive as a time-ordered `&[Event]` per block. Outgoing
//! events are collected in [`OutputEvents`], a fixed-capacity list that is
//! allocated once at activation and never grows on the audio thread.

use crate::note::NoteId;
use crate::parameter_info::ParameterId;

/// Per-note expression dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteExpression {
    Volume,
    Pan,
    Tuning,
    Vibrato,
    Expression,
    Brightness,
    Pressure,
}

/// Event payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventBody {
    NoteOn { note: NoteId, velocity: f64 },
    NoteOff { note: NoteId, velocity: f64 },
    /// Host-mandated immediate termination, bypassing any release.
    NoteChoke { note: NoteId },
    /// A voice has finished; sent from the plugin to the host.
    NoteEnd { note: NoteId },
    NoteExpression {
        note: NoteId,
        expression: NoteExpression,
        value: f64,
    },
    /// Raw parameter value.
    ParamValue { id: ParameterId, value: f64 },
    /// Raw modulation offset added to the parameter value.
    ParamMod { id: ParameterId, amount: f64 },
    GestureBegin { id: ParameterId },
    GestureEnd { id: ParameterId },
}

impl EventBody {
    /// Whether the event is routed to note handling rather than parameters.
    pub fn is_note(&self) -> bool {
        matches!(
            self,
            EventBody::NoteOn { .. }
                | EventBody::NoteOff { .. }
                | EventBody::NoteChoke { .. }
                | EventBody::NoteEnd { .. }
                | EventBody::NoteExpression { .. }
        )
    }
}

/// An event with its sample offset inside the current block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub time: u32,
    pub body: EventBody,
}

impl Event {
    pub const fn new(time: u32, body: EventBody) -> Self {
        Self { time, body }
    }
}

/// Pre-allocated output event list for one process call.
///
/// Events pushed through [`push_now`](Self::push_now) are stamped with the
/// frame the scheduler is currently at. When the list is full further
/// events are dropped and the overflow flag is set.
#[derive(Debug, Clone)]
pub struct OutputEvents {
    events: Vec<Event>,
    max_events: usize,
    now: u32,
    overflowed: bool,
}

impl OutputEvents {
    /// Default number of output events per process call.
    pub const DEFAULT_CAPACITY: usize = 512;

    /// Create a list with room for `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            max_events: capacity,
            now: 0,
            overflowed: false,
        }
    }

    /// Clear the list for reuse. Keeps the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.now = 0;
        self.overflowed = false;
    }

    /// Set the frame used by [`push_now`](Self::push_now).
    #[inline]
    pub fn set_time(&mut self, frame: u32) {
        self.now = frame;
    }

    /// Current frame.
    #[inline]
    pub fn time(&self) -> u32 {
        self.now
    }

    /// Append an event. Returns `false` if the list is full.
    #[inline]
    pub fn push(&mut self, event: Event) -> bool {
        if self.events.len() >= self.max_events {
            self.overflowed = true;
            return false;
        }
        self.events.push(event);
        true
    }

    /// Append an event at the current frame.
    #[inline]
    pub fn push_now(&mut self, body: EventBody) -> bool {
        self.push(Event::new(self.now, body))
    }

    /// Check if events were dropped since the last clear.
    #[inline]
    pub fn has_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Get the list's capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl Default for OutputEvents {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a OutputEvents {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_now_stamps_current_frame() {
        let mut out = OutputEvents::with_capacity(4);
        out.push_now(EventBody::GestureBegin { id: 1 });
        out.set_time(7);
        out.push_now(EventBody::NoteEnd { note: NoteId::with_key(60) });
        assert_eq!(out.as_slice()[0].time, 0);
        assert_eq!(out.as_slice()[1].time, 7);
        out.clear();
        assert!(out.is_empty());
        assert_eq!(out.time(), 0);
    }

    #[test]
    fn test_overflow_drops_and_flags() {
        let mut out = OutputEvents::with_capacity(1);
        assert!(out.push_now(EventBody::GestureEnd { id: 0 }));
        assert!(!out.push_now(EventBody::GestureEnd { id: 1 }));
        assert!(out.has_overflowed());
        assert_eq!(out.len(), 1);
        assert_eq!(out.capacity(), 1);
        out.clear();
        assert!(!out.has_overflowed());
    }

    #[test]
    fn test_is_note() {
        assert!(EventBody::NoteChoke { note: NoteId::ANY }.is_note());
        assert!(!EventBody::ParamMod { id: 0, amount: 0.1 }.is_note());
    }
}
