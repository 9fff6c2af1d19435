//! Shared fixtures: a recording host and a small test instrument.

#![allow(dead_code)]

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use trellis_core::{
    AudioBlock, AudioInstance, Category, Config, Event, EventBody, HostCapabilities, LogSeverity, MainContext,
    NoteId, OutputEvents, ParameterDescriptor, Plugin, PluginInstance, PluginResult,
    ProcessContext, ProcessStatus, Processor, Setup, StateFormat, TimerId, TimerTag, Voice,
    VoiceContext, VoiceControl, VoicePool,
};

pub static CONFIG: Config = Config::new("org.trellis.test", "Test Instrument", Category::Instrument);

pub const GAIN: u32 = 0;
pub const VOICES: u32 = 1;
pub const MODE: u32 = 2;

pub const REFRESH_TAG: TimerTag = 7;

// =============================================================================
// Host
// =============================================================================

/// Host that records everything the plugin asks of it.
#[derive(Default)]
pub struct MockHost {
    pub extensions: Vec<&'static str>,
    pub logs: Mutex<Vec<(LogSeverity, String)>>,
    pub timers: Mutex<Vec<(TimerId, u32)>>,
    pub cancelled: Mutex<Vec<TimerId>>,
    pub callbacks: AtomicU32,
    next_timer: AtomicU32,
}

impl MockHost {
    /// Host supporting timers and logging.
    pub fn full() -> Arc<Self> {
        Arc::new(Self {
            extensions: vec!["log", "timer-support", "params", "state"],
            ..Self::default()
        })
    }

    pub fn logged(&self, severity: LogSeverity) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn live_timers(&self) -> Vec<TimerId> {
        let cancelled = self.cancelled.lock().unwrap();
        self.timers
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !cancelled.contains(id))
            .collect()
    }
}

impl HostCapabilities for MockHost {
    fn name(&self) -> &str {
        "mock host"
    }

    fn supports_extension(&self, name: &str) -> bool {
        self.extensions.contains(&name)
    }

    fn log(&self, severity: LogSeverity, message: &str) {
        self.logs.lock().unwrap().push((severity, message.to_owned()));
    }

    fn request_callback(&self) {
        self.callbacks.fetch_add(1, Ordering::Relaxed);
    }

    fn register_timer(&self, period_ms: u32) -> Option<TimerId> {
        if !self.extensions.contains(&"timer-support") {
            return None;
        }
        let id = self.next_timer.fetch_add(1, Ordering::Relaxed) + 1;
        self.timers.lock().unwrap().push((id, period_ms));
        Some(id)
    }

    fn unregister_timer(&self, id: TimerId) -> bool {
        self.cancelled.lock().unwrap().push(id);
        true
    }
}

// =============================================================================
// Instrument
// =============================================================================

/// Voice that writes its velocity while held and falls silent one render
/// after release.
#[derive(Debug, Default)]
pub struct TestVoice {
    pub velocity: f64,
    pub playing: bool,
    pub releasing: bool,
}

impl Voice for TestVoice {
    fn note_on(&mut self, _note: NoteId, velocity: f64) {
        self.velocity = velocity;
        self.playing = true;
        self.releasing = false;
    }

    fn note_off(&mut self) {
        self.releasing = true;
    }

    fn choke(&mut self) {
        self.playing = false;
        self.releasing = false;
    }

    fn render(&mut self, ctx: &VoiceContext<'_>, out: &mut AudioBlock<'_, '_>, range: Range<usize>) -> bool {
        if self.releasing {
            self.playing = false;
            self.releasing = false;
        }
        if !self.playing {
            return false;
        }
        let level = (self.velocity * ctx.params.plain(GAIN)) as f32;
        if let Some(samples) = out.output(0, range) {
            for sample in samples {
                *sample += level;
            }
        }
        true
    }
}

pub struct TestProcessor {
    pub pool: VoicePool<TestVoice>,
    pub resets: Arc<AtomicU32>,
}

impl Processor for TestProcessor {
    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn process_audio(
        &mut self,
        ctx: &mut ProcessContext<'_>,
        audio: &mut AudioBlock<'_, '_>,
        range: Range<usize>,
    ) -> ProcessStatus {
        self.pool.process(ctx, audio, range)
    }

    fn voices(&mut self) -> Option<&mut dyn VoiceControl> {
        Some(&mut self.pool)
    }
}

/// Test plugin with three parameters: gain (numeric), voices (integer)
/// and mode (enumerated).
pub struct TestPlugin {
    pub voices: usize,
    pub register_all: bool,
    pub attach_processor: bool,
    pub state_format: StateFormat,
    pub timer_period: Option<u32>,
    pub cancel_in_callback: bool,
    pub gui: bool,
    pub fired: Arc<Mutex<Vec<TimerTag>>>,
    pub main_thread_calls: Arc<AtomicU32>,
    pub resets: Arc<AtomicU32>,
    pub timer: Option<TimerId>,
}

impl Default for TestPlugin {
    fn default() -> Self {
        Self {
            voices: 2,
            register_all: true,
            attach_processor: true,
            state_format: StateFormat::Binary,
            timer_period: None,
            cancel_in_callback: false,
            gui: false,
            fired: Arc::default(),
            main_thread_calls: Arc::default(),
            resets: Arc::default(),
            timer: None,
        }
    }
}

impl Plugin for TestPlugin {
    fn configure(&mut self, setup: &mut Setup) -> PluginResult<()> {
        setup.parameter_count(3)?;
        setup.parameter(GAIN, ParameterDescriptor::numeric("gain", "Gain", 0.0, 1.0, 0.5))?;
        setup.parameter(VOICES, ParameterDescriptor::integer("voices", "Voices", 1, 8, 2))?;
        if self.register_all {
            setup.parameter(MODE, ParameterDescriptor::enumerated("mode", "Mode", &["a", "b", "c"], 0))?;
        }
        if self.attach_processor {
            setup.processor(TestProcessor {
                pool: VoicePool::new(self.voices, self.voices, TestVoice::default),
                resets: Arc::clone(&self.resets),
            });
        }
        setup.state_format(self.state_format);
        if self.timer_period.is_some() {
            setup.enable_timers();
        }
        if self.gui {
            setup.enable_gui(None);
        }
        Ok(())
    }

    fn on_init(&mut self, ctx: &mut MainContext<'_>) {
        if let Some(period) = self.timer_period {
            self.timer = ctx.host.add_timer(period, REFRESH_TAG);
        }
    }

    fn on_timer(&mut self, tag: TimerTag, ctx: &mut MainContext<'_>) {
        self.fired.lock().unwrap().push(tag);
        if self.cancel_in_callback {
            if let Some(id) = self.timer.take() {
                ctx.host.cancel_timer(id);
            }
        }
    }

    fn on_main_thread(&mut self, _ctx: &mut MainContext<'_>) {
        self.main_thread_calls.fetch_add(1, Ordering::Relaxed);
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn instance_with(plugin: TestPlugin, host: Arc<MockHost>) -> PluginInstance {
    PluginInstance::new(&CONFIG, Box::new(plugin), host)
}

/// Instance in the processing bracket, its audio half and the host.
pub struct Running {
    pub instance: PluginInstance,
    pub audio: AudioInstance,
    pub host: Arc<MockHost>,
}

/// Initialized, activated and processing instance with default settings.
pub fn processing(plugin: TestPlugin) -> Running {
    let host = MockHost::full();
    let mut instance = instance_with(plugin, Arc::clone(&host));
    instance.init().unwrap();
    instance.activate(48000.0, 1, 512).unwrap();
    let audio = instance.start_processing().unwrap();
    Running { instance, audio, host }
}

/// Run one mono block of `frames` frames and return the output events.
pub fn run_block(audio: &mut AudioInstance, events: &[Event], frames: usize) -> (Vec<f32>, OutputEvents) {
    let mut left = vec![0.0f32; frames];
    let mut out = OutputEvents::with_capacity(64);
    {
        let mut outputs = [&mut left[..]];
        let mut block = AudioBlock::outputs_only(&mut outputs);
        audio.process(events, &mut block, &mut out);
    }
    (left, out)
}

pub fn note(id: u32, key: u16) -> NoteId {
    NoteId::with_key(key).id(id)
}

pub fn note_on(time: u32, note: NoteId) -> Event {
    Event::new(time, EventBody::NoteOn { note, velocity: 1.0 })
}

pub fn note_off(time: u32, note: NoteId) -> Event {
    Event::new(time, EventBody::NoteOff { note, velocity: 0.0 })
}

pub fn note_ends(out: &OutputEvents) -> Vec<NoteId> {
    out.iter()
        .filter_map(|event| match event.body {
            EventBody::NoteEnd { note } => Some(note),
            _ => None,
        })
        .collect()
}
