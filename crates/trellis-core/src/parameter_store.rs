//! Main-side and audio-side parameter stores.
//!
//! Each side owns its own array of raw values, indexed by parameter id.
//! The two arrays are reconciled only through a pair of change channels:
//!
//! ```text
//!   MainParameters ──(main→audio: SetValue, gestures)──▶ AudioParameters
//!   MainParameters ◀──(audio→main: SetValue, SetModulation)── AudioParameters
//! ```
//!
//! The audio side drains main→audio once per block before any event is
//! applied ([`AudioParameters::flush_from_main`]) and re-emits those changes
//! to the host at time zero. The main side drains audio→main lazily, before
//! any value read it reports to the host and before state is saved.
//!
//! A value the main side could not queue because main→audio was full is
//! remembered and re-sent, with its latest value, on the next main-side
//! call that finds room in the channel.
//!
//! Unknown ids read as `0.0` and are ignored by every write.

use std::sync::Arc;

use crate::channel::{channel, ChangeKind, ChangeReceiver, ChangeRecord, ChangeSender};
use crate::events::{Event, EventBody, OutputEvents};
use crate::parameter_info::{ParameterDescriptor, ParameterId};
use crate::parameter_registry::ParameterRegistry;

/// Create a connected store pair initialised to the registry defaults.
pub fn parameter_stores(
    registry: Arc<ParameterRegistry>,
    capacity: usize,
) -> (MainParameters, AudioParameters) {
    let (to_audio, from_main) = channel(capacity);
    let (to_main, from_audio) = channel(capacity);
    let defaults = registry.default_values();
    let count = defaults.len();

    let main = MainParameters {
        registry: Arc::clone(&registry),
        values: defaults.clone(),
        modulations: vec![0.0; count],
        to_audio,
        from_audio,
        dropped: 0,
        unsent: vec![false; count],
        unsent_count: 0,
    };
    let audio = AudioParameters {
        registry,
        values: defaults,
        modulations: vec![0.0; count],
        from_main,
        to_main,
    };
    (main, audio)
}

/// Parameter values as seen by the main thread.
#[derive(Debug)]
pub struct MainParameters {
    registry: Arc<ParameterRegistry>,
    values: Vec<f64>,
    modulations: Vec<f64>,
    to_audio: ChangeSender,
    from_audio: ChangeReceiver,
    dropped: usize,
    unsent: Vec<bool>,
    unsent_count: usize,
}

impl MainParameters {
    /// The registry both stores were built from.
    pub fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    /// Number of parameters.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Current raw value of `id`, after draining changes from the audio side.
    pub fn get(&mut self, id: ParameterId) -> f64 {
        self.flush_from_audio();
        self.peek(id)
    }

    /// Current raw value of `id` without draining the audio side.
    pub fn peek(&self, id: ParameterId) -> f64 {
        self.values.get(id as usize).copied().unwrap_or(0.0)
    }

    /// All raw values in id order, without draining the audio side.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last modulation offset reported by the audio side.
    pub fn modulation(&self, id: ParameterId) -> f64 {
        self.modulations.get(id as usize).copied().unwrap_or(0.0)
    }

    /// Write a raw value and queue it for the audio side. Never blocks.
    pub fn set(&mut self, id: ParameterId, value: f64) {
        let Some(descriptor) = self.registry.get(id) else {
            return;
        };
        let value = descriptor.clamp_raw(value);
        self.resend_dropped();
        self.values[id as usize] = value;
        if self.send(ChangeRecord::set_value(id, value)) {
            self.mark_sent(id as usize);
        } else if !self.unsent[id as usize] {
            self.unsent[id as usize] = true;
            self.unsent_count += 1;
        }
    }

    /// Begin a user gesture on `id`.
    pub fn start_gesture(&mut self, id: ParameterId) {
        if self.registry.get(id).is_some() {
            self.resend_dropped();
            self.send(ChangeRecord::start_gesture(id));
        }
    }

    /// End a user gesture on `id`.
    pub fn stop_gesture(&mut self, id: ParameterId) {
        if self.registry.get(id).is_some() {
            self.resend_dropped();
            self.send(ChangeRecord::stop_gesture(id));
        }
    }

    /// Set every parameter to its default.
    pub fn reset_all_to_default(&mut self) {
        let registry = Arc::clone(&self.registry);
        for descriptor in registry.iter() {
            self.set(descriptor.id, descriptor.raw_default());
        }
    }

    /// Apply every pending change from the audio side.
    pub fn flush_from_audio(&mut self) {
        while let Some(change) = self.from_audio.pop() {
            let index = change.id as usize;
            match change.kind {
                ChangeKind::SetValue => {
                    if let Some(value) = self.values.get_mut(index) {
                        *value = change.value;
                        // the audio side now holds this value already
                        self.mark_sent(index);
                    }
                }
                ChangeKind::SetModulation => {
                    if let Some(modulation) = self.modulations.get_mut(index) {
                        *modulation = change.value;
                    }
                }
                ChangeKind::StartGesture | ChangeKind::StopGesture => {}
            }
        }
        self.resend_dropped();
    }

    /// Number of records dropped because the main→audio channel was full.
    pub fn dropped_changes(&self) -> usize {
        self.dropped
    }

    /// Values still waiting for room in the main→audio channel.
    pub fn unsent_changes(&self) -> usize {
        self.unsent_count
    }

    /// Queue the current value of every parameter whose last change was
    /// dropped, as far as the channel has room.
    pub fn resend_dropped(&mut self) {
        if self.unsent_count == 0 {
            return;
        }
        for index in 0..self.unsent.len() {
            if self.to_audio.vacant() == 0 {
                break;
            }
            if self.unsent[index] {
                let record = ChangeRecord::set_value(index as ParameterId, self.values[index]);
                if self.to_audio.push(record) {
                    self.mark_sent(index);
                }
            }
        }
    }

    fn mark_sent(&mut self, index: usize) {
        if let Some(flag) = self.unsent.get_mut(index) {
            if *flag {
                *flag = false;
                self.unsent_count -= 1;
            }
        }
    }

    fn send(&mut self, record: ChangeRecord) -> bool {
        let sent = self.to_audio.push(record);
        if !sent {
            self.dropped += 1;
        }
        sent
    }
}

/// Parameter values as seen by the audio thread.
///
/// Nothing here allocates after construction.
#[derive(Debug)]
pub struct AudioParameters {
    registry: Arc<ParameterRegistry>,
    values: Vec<f64>,
    modulations: Vec<f64>,
    from_main: ChangeReceiver,
    to_main: ChangeSender,
}

impl AudioParameters {
    /// The registry both stores were built from.
    pub fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    /// Descriptor for `id`.
    pub fn descriptor(&self, id: ParameterId) -> Option<&ParameterDescriptor> {
        self.registry.get(id)
    }

    /// Number of parameters.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Raw value of `id` without modulation.
    #[inline]
    pub fn get(&self, id: ParameterId) -> f64 {
        self.values.get(id as usize).copied().unwrap_or(0.0)
    }

    /// Modulation offset of `id`.
    #[inline]
    pub fn modulation(&self, id: ParameterId) -> f64 {
        self.modulations.get(id as usize).copied().unwrap_or(0.0)
    }

    /// Raw value plus modulation, clamped to the raw range.
    pub fn modulated(&self, id: ParameterId) -> f64 {
        match self.registry.get(id) {
            Some(descriptor) => descriptor.clamp_raw(self.get(id) + self.modulation(id)),
            None => 0.0,
        }
    }

    /// Modulated value of `id` in plain units.
    pub fn plain(&self, id: ParameterId) -> f64 {
        self.registry
            .get(id)
            .map_or(0.0, |descriptor| descriptor.to_plain(self.modulated(id)))
    }

    /// Modulated value of `id` as an integer.
    pub fn integer(&self, id: ParameterId) -> i32 {
        self.registry
            .get(id)
            .map_or(0, |descriptor| descriptor.to_integer(self.modulated(id)))
    }

    /// Modulated value of `id` as a label index.
    pub fn index(&self, id: ParameterId) -> usize {
        self.registry
            .get(id)
            .map_or(0, |descriptor| descriptor.to_index(self.modulated(id)))
    }

    /// Modulated value of `id` as a switch state.
    pub fn flag(&self, id: ParameterId) -> bool {
        self.registry
            .get(id)
            .is_some_and(|descriptor| descriptor.to_bool(self.modulated(id)))
    }

    /// Change a value from the audio side (e.g. an internal modulation
    /// source) and report it to the main side.
    pub fn set(&mut self, id: ParameterId, value: f64) {
        let Some(descriptor) = self.registry.get(id) else {
            return;
        };
        let value = descriptor.clamp_raw(value);
        self.values[id as usize] = value;
        self.to_main.push(ChangeRecord::set_value(id, value));
    }

    /// Set the modulation offset of `id` and report it to the main side.
    pub fn set_modulation(&mut self, id: ParameterId, amount: f64) {
        if let Some(modulation) = self.modulations.get_mut(id as usize) {
            *modulation = amount;
            self.to_main.push(ChangeRecord::set_modulation(id, amount));
        }
    }

    /// Clear every modulation offset.
    pub fn clear_modulations(&mut self) {
        for id in 0..self.modulations.len() {
            if self.modulations[id] != 0.0 {
                self.set_modulation(id as ParameterId, 0.0);
            }
        }
    }

    /// Apply a host parameter event. Returns `false` for non-parameter events.
    pub fn handle_event(&mut self, body: &EventBody) -> bool {
        match *body {
            EventBody::ParamValue { id, value } => {
                self.set(id, value);
                true
            }
            EventBody::ParamMod { id, amount } => {
                self.set_modulation(id, amount);
                true
            }
            _ => false,
        }
    }

    /// Drain the main→audio channel, applying values and re-emitting every
    /// change to the host at time zero.
    pub fn flush_from_main(&mut self, out: &mut OutputEvents) {
        while let Some(change) = self.from_main.pop() {
            let id = change.id;
            match change.kind {
                ChangeKind::SetValue => {
                    if let Some(value) = self.values.get_mut(id as usize) {
                        *value = change.value;
                        out.push(Event::new(0, EventBody::ParamValue { id, value: change.value }));
                    }
                }
                ChangeKind::StartGesture => {
                    out.push(Event::new(0, EventBody::GestureBegin { id }));
                }
                ChangeKind::StopGesture => {
                    out.push(Event::new(0, EventBody::GestureEnd { id }));
                }
                ChangeKind::SetModulation => {
                    if let Some(modulation) = self.modulations.get_mut(id as usize) {
                        *modulation = change.value;
                    }
                }
            }
        }
    }
}
