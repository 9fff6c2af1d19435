//! Polyphonic voice allocation.
//!
//! A [`VoicePool`] owns a fixed array of voice slots, preallocated up to
//! `max_voices` when the pool is built. Each slot holds a [`Voice`] and the
//! [`NoteId`] it is currently playing, if any. Slots never reference the
//! pool; note-end notifications go straight into the block's
//! [`OutputEvents`].
//!
//! Allocation for a note-on, in order:
//! 1. a slot already playing a matching note (retrigger); a slot with the
//!    same note id wins over one that only matches through wildcards,
//! 2. the lowest-index idle slot,
//! 3. the least recently triggered slot (steal).
//!
//! Whenever a slot's note is replaced or freed, a `NoteEnd` for the old
//! note is emitted.

use std::collections::VecDeque;
use std::ops::Range;

use crate::audio::{AudioBlock, ProcessStatus};
use crate::events::{EventBody, NoteExpression, OutputEvents};
use crate::note::NoteId;
use crate::parameter_store::AudioParameters;

/// Maximum number of notes the mono strategy remembers as held.
pub const MAX_HELD_NOTES: usize = 128;

/// Read-only data a voice may use while rendering.
pub struct VoiceContext<'a> {
    pub params: &'a AudioParameters,
    pub sample_rate: f64,
}

/// One sound generator inside a [`VoicePool`].
pub trait Voice: Send {
    /// Start (or restart) playing `note`.
    fn note_on(&mut self, note: NoteId, velocity: f64);

    /// Begin the release phase. The slot stays active until `render`
    /// reports silence.
    fn note_off(&mut self);

    /// Stop immediately without a release.
    fn choke(&mut self);

    /// Per-note expression change.
    fn note_expression(&mut self, expression: NoteExpression, value: f64) {
        let _ = (expression, value);
    }

    /// Add this voice's output into `out` over `range`. Returns `false` once
    /// the voice has gone silent.
    fn render(&mut self, ctx: &VoiceContext<'_>, out: &mut AudioBlock<'_, '_>, range: Range<usize>) -> bool;

    /// Clear transient DSP state.
    fn reset(&mut self) {}
}

/// Allocation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceStrategy {
    /// One slot per note, with stealing.
    #[default]
    Poly,
    /// A single slot with last-note priority over the held notes.
    MonoLast,
}

/// Note handling the event scheduler drives without knowing the voice type.
pub trait VoiceControl {
    fn note_on(&mut self, note: NoteId, velocity: f64, out: &mut OutputEvents);
    fn note_off(&mut self, note: NoteId, out: &mut OutputEvents);
    fn note_choke(&mut self, note: NoteId, out: &mut OutputEvents);
    fn note_expression(&mut self, note: NoteId, expression: NoteExpression, value: f64);
    /// Choke every active voice.
    fn choke_all(&mut self, out: &mut OutputEvents);
    fn active_voice_count(&self) -> usize;
}

struct VoiceSlot<V> {
    active_note: Option<NoteId>,
    voice: V,
}

/// Fixed-capacity pool of voices.
pub struct VoicePool<V: Voice> {
    slots: Vec<VoiceSlot<V>>,
    num_voices: usize,
    recency: VecDeque<usize>,
    strategy: VoiceStrategy,
    held: Vec<(NoteId, f64)>,
}

impl<V: Voice> VoicePool<V> {
    /// Build `max_voices` voices with `factory`; the first `num_voices`
    /// take part in allocation.
    pub fn new(max_voices: usize, num_voices: usize, mut factory: impl FnMut() -> V) -> Self {
        let slots = (0..max_voices)
            .map(|_| VoiceSlot {
                active_note: None,
                voice: factory(),
            })
            .collect();
        Self {
            slots,
            num_voices: num_voices.min(max_voices),
            recency: VecDeque::with_capacity(max_voices),
            strategy: VoiceStrategy::Poly,
            held: Vec::with_capacity(MAX_HELD_NOTES),
        }
    }

    pub fn max_voices(&self) -> usize {
        self.slots.len()
    }

    pub fn num_voices(&self) -> usize {
        self.num_voices
    }

    pub fn strategy(&self) -> VoiceStrategy {
        self.strategy
    }

    /// Number of slots currently playing a note.
    pub fn active_voice_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active_note.is_some()).count()
    }

    /// Note assigned to slot `index`.
    pub fn active_note(&self, index: usize) -> Option<NoteId> {
        self.slots.get(index).and_then(|slot| slot.active_note)
    }

    /// Notes currently assigned, in slot order.
    pub fn active_notes(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.slots.iter().filter_map(|slot| slot.active_note)
    }

    /// Voice in slot `index`.
    pub fn voice(&self, index: usize) -> Option<&V> {
        self.slots.get(index).map(|slot| &slot.voice)
    }

    /// Resize the set of usable slots. Every active voice is choked first.
    pub fn set_num_voices(&mut self, num_voices: usize, out: &mut OutputEvents) {
        let num_voices = num_voices.min(self.slots.len());
        if num_voices != self.num_voices {
            self.stop_all(out);
            self.num_voices = num_voices;
        }
    }

    /// Switch allocation policy. Every active voice is choked first.
    pub fn set_strategy(&mut self, strategy: VoiceStrategy, out: &mut OutputEvents) {
        if strategy != self.strategy {
            self.stop_all(out);
            self.strategy = strategy;
        }
    }

    /// Choke every voice and clear allocation history.
    pub fn stop_all(&mut self, out: &mut OutputEvents) {
        for index in 0..self.slots.len() {
            self.free(index, out);
        }
        self.recency.clear();
        self.held.clear();
    }

    /// Choke every voice and clear each voice's DSP state.
    pub fn reset(&mut self, out: &mut OutputEvents) {
        self.stop_all(out);
        for slot in &mut self.slots {
            slot.voice.reset();
        }
    }

    /// Start `note`, allocating a slot according to the strategy.
    pub fn note_on(&mut self, note: NoteId, velocity: f64, out: &mut OutputEvents) {
        if self.num_voices == 0 {
            return;
        }
        match self.strategy {
            VoiceStrategy::Poly => {
                let index = self.allocate(&note);
                self.assign(index, note, velocity, out);
            }
            VoiceStrategy::MonoLast => {
                self.held.retain(|(held, _)| !held.matches(&note));
                if self.held.len() >= MAX_HELD_NOTES {
                    return;
                }
                self.held.push((note, velocity));
                self.assign(0, note, velocity, out);
            }
        }
    }

    /// Release `note` in every matching slot.
    pub fn note_off(&mut self, note: NoteId, out: &mut OutputEvents) {
        match self.strategy {
            VoiceStrategy::Poly => {
                for slot in &mut self.slots[..self.num_voices] {
                    if slot.active_note.is_some_and(|active| active.matches(&note)) {
                        slot.voice.note_off();
                    }
                }
            }
            VoiceStrategy::MonoLast => {
                let sounding = self.held.last().is_some_and(|(held, _)| held.matches(&note));
                self.held.retain(|(held, _)| !held.matches(&note));
                if !sounding || self.num_voices == 0 {
                    return;
                }
                match self.held.last().copied() {
                    Some((previous, velocity)) => self.assign(0, previous, velocity, out),
                    None => self.slots[0].voice.note_off(),
                }
            }
        }
    }

    /// Immediately free every slot matching `note`.
    pub fn note_choke(&mut self, note: NoteId, out: &mut OutputEvents) {
        if self.strategy == VoiceStrategy::MonoLast {
            self.held.retain(|(held, _)| !held.matches(&note));
        }
        for index in 0..self.num_voices {
            if self.slots[index].active_note.is_some_and(|active| active.matches(&note)) {
                self.free(index, out);
            }
        }
    }

    /// Forward an expression change to every matching slot.
    pub fn note_expression(&mut self, note: NoteId, expression: NoteExpression, value: f64) {
        for slot in &mut self.slots[..self.num_voices] {
            if slot.active_note.is_some_and(|active| active.matches(&note)) {
                slot.voice.note_expression(expression, value);
            }
        }
    }

    /// Zero `range` of the outputs and sum every active voice into it.
    /// Voices that report silence are freed.
    pub fn render(
        &mut self,
        ctx: &VoiceContext<'_>,
        audio: &mut AudioBlock<'_, '_>,
        range: Range<usize>,
        out: &mut OutputEvents,
    ) -> ProcessStatus {
        audio.clear_outputs(range.clone());
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            let Some(note) = slot.active_note else {
                continue;
            };
            if !slot.voice.render(ctx, audio, range.clone()) {
                slot.active_note = None;
                out.push_now(EventBody::NoteEnd { note });
                self.forget(index);
            }
        }
        if self.active_voice_count() > 0 {
            ProcessStatus::Continue
        } else {
            ProcessStatus::Sleep
        }
    }

    fn allocate(&mut self, note: &NoteId) -> usize {
        let active = &self.slots[..self.num_voices];
        if note.id.is_some() {
            if let Some(index) = active
                .iter()
                .position(|slot| slot.active_note.is_some_and(|a| a.id == note.id))
            {
                return index;
            }
        }
        if let Some(index) = active
            .iter()
            .position(|slot| slot.active_note.is_some_and(|a| a.matches(note)))
        {
            return index;
        }
        if let Some(index) = active.iter().position(|slot| slot.active_note.is_none()) {
            return index;
        }
        self.recency
            .pop_front()
            .filter(|&index| index < self.num_voices)
            .unwrap_or(0)
    }

    fn assign(&mut self, index: usize, note: NoteId, velocity: f64, out: &mut OutputEvents) {
        let slot = &mut self.slots[index];
        if let Some(old) = slot.active_note.replace(note) {
            out.push_now(EventBody::NoteEnd { note: old });
        }
        slot.voice.note_on(note, velocity);
        self.touch(index);
    }

    fn free(&mut self, index: usize, out: &mut OutputEvents) {
        let slot = &mut self.slots[index];
        if let Some(note) = slot.active_note.take() {
            out.push_now(EventBody::NoteEnd { note });
            slot.voice.choke();
            self.forget(index);
        }
    }

    fn touch(&mut self, index: usize) {
        self.forget(index);
        self.recency.push_back(index);
    }

    fn forget(&mut self, index: usize) {
        self.recency.retain(|&queued| queued != index);
    }
}

impl<V: Voice> VoiceControl for VoicePool<V> {
    fn note_on(&mut self, note: NoteId, velocity: f64, out: &mut OutputEvents) {
        VoicePool::note_on(self, note, velocity, out);
    }

    fn note_off(&mut self, note: NoteId, out: &mut OutputEvents) {
        VoicePool::note_off(self, note, out);
    }

    fn note_choke(&mut self, note: NoteId, out: &mut OutputEvents) {
        VoicePool::note_choke(self, note, out);
    }

    fn note_expression(&mut self, note: NoteId, expression: NoteExpression, value: f64) {
        VoicePool::note_expression(self, note, expression, value);
    }

    fn choke_all(&mut self, out: &mut OutputEvents) {
        self.stop_all(out);
    }

    fn active_voice_count(&self) -> usize {
        VoicePool::active_voice_count(self)
    }
}
