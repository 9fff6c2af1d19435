//! Trellis Sines - a small polyphonic sine synthesizer.
//!
//! # Features Demonstrated
//!
//! - Parameter registration with numeric and integer kinds
//! - A [`VoicePool`] driven by note events from the scheduler
//! - Polyphony changed live from a parameter (voices are choked on resize)
//! - TOML state with preset metadata
//! - The GUI bridge without a custom handler
//!
//! # Parameters
//!
//! | Id | Key       | Range        | Default |
//! |----|-----------|--------------|---------|
//! | 0  | fall      | 0.0001..=1.0 | 0.01    |
//! | 1  | polyphony | 1..=16       | 8       |

use trellis::prelude::*;

// =============================================================================
// Plugin Configuration
// =============================================================================

pub static CONFIG: Config = Config::new("com.trellis.sines", "Sines", Category::Instrument)
    .with_vendor("Trellis")
    .with_version(env!("CARGO_PKG_VERSION"))
    .with_description("a simple sine wave synth")
    .with_features(&[Feature::Synthesizer, Feature::Stereo]);

/// Amplitude smoothing factor per sample.
pub const FALL: ParameterId = 0;
/// Number of voices taking part in allocation.
pub const POLYPHONY: ParameterId = 1;
const PARAMETER_COUNT: usize = 2;

const MAX_VOICES: usize = 16;
const DEFAULT_VOICES: i32 = 8;

/// Below this level a released voice counts as silent.
const SILENCE: f64 = 0.0001;

const STATE_VERSION: u32 = 1;

fn mtof(key: f64) -> f64 {
    (2.0f64).powf((key - 69.0) / 12.0) * 440.0
}

// =============================================================================
// Voice
// =============================================================================

#[derive(Debug, Default)]
pub struct SineVoice {
    frequency: f64,
    phase: f64,
    velocity: f64,
    amplitude: f64,
    target: f64,
}

impl SineVoice {
    #[inline]
    fn next_sample(&mut self, fall: f64, step: f64) -> f32 {
        // NOTE: sample-rate dependent smoothing
        self.amplitude += (self.target - self.amplitude) * fall;
        self.phase += step;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        let wave = (self.phase * std::f64::consts::TAU).sin();
        (wave * self.amplitude * self.velocity) as f32
    }
}

impl Voice for SineVoice {
    fn note_on(&mut self, note: NoteId, velocity: f64) {
        self.frequency = mtof(note.key.map_or(69.0, f64::from));
        self.velocity = velocity;
        self.amplitude = 1.0;
        self.target = 1.0;
    }

    fn note_off(&mut self) {
        self.target = 0.0;
    }

    fn choke(&mut self) {
        self.amplitude = 0.0;
        self.target = 0.0;
    }

    fn render(&mut self, ctx: &VoiceContext<'_>, out: &mut AudioBlock<'_, '_>, range: Range<usize>) -> bool {
        let fall = ctx.params.plain(FALL);
        let step = self.frequency / ctx.sample_rate;

        if out.num_outputs() >= 2 {
            if let Some((left, right)) = out.stereo_out(range) {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    let sample = self.next_sample(fall, step);
                    *l += sample;
                    *r += sample;
                }
            }
        } else if let Some(mono) = out.output(0, range) {
            for sample in mono {
                *sample += self.next_sample(fall, step);
            }
        }

        !(self.amplitude < SILENCE && self.target == 0.0)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// Processor
// =============================================================================

pub struct SinesProcessor {
    voices: VoicePool<SineVoice>,
}

impl SinesProcessor {
    pub fn new() -> Self {
        Self {
            voices: VoicePool::new(MAX_VOICES, DEFAULT_VOICES as usize, SineVoice::default),
        }
    }

    pub fn voice_pool(&self) -> &VoicePool<SineVoice> {
        &self.voices
    }
}

impl Default for SinesProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for SinesProcessor {
    fn process_audio(
        &mut self,
        ctx: &mut ProcessContext<'_>,
        audio: &mut AudioBlock<'_, '_>,
        range: Range<usize>,
    ) -> ProcessStatus {
        let polyphony = ctx.params.integer(POLYPHONY).max(1) as usize;
        self.voices.set_num_voices(polyphony, &mut *ctx.events);
        self.voices.process(ctx, audio, range)
    }

    fn voices(&mut self) -> Option<&mut dyn VoiceControl> {
        Some(&mut self.voices)
    }
}

// =============================================================================
// Plugin
// =============================================================================

#[derive(Debug, Default)]
pub struct Sines;

impl Plugin for Sines {
    fn configure(&mut self, setup: &mut Setup) -> PluginResult<()> {
        setup.parameter_count(PARAMETER_COUNT)?;
        setup.parameter(
            FALL,
            ParameterDescriptor::numeric("fall", "Fall", 0.0001, 1.0, 0.01).modulatable(),
        )?;
        setup.parameter(
            POLYPHONY,
            ParameterDescriptor::integer("polyphony", "Polyphony", 1, MAX_VOICES as i32, DEFAULT_VOICES)
                .with_unit("voices")
                .with_unit_singular("voice"),
        )?;
        setup.processor(SinesProcessor::new());
        setup.state_format(StateFormat::Toml { version: STATE_VERSION });
        setup.preset(PresetInfo {
            name: "Init".into(),
            ..PresetInfo::default()
        });
        setup.enable_gui(None);
        Ok(())
    }

    fn migrate_state(&mut self, document: &mut toml::Table, from: u32, to: u32) -> Result<(), String> {
        log::info!("sines state v{from} -> v{to}");
        // v0 stored the fall rate as "release"
        if from == 0 {
            if let Some(params) = document.get_mut("params").and_then(toml::Value::as_table_mut) {
                if let Some(value) = params.remove("release") {
                    params.insert("fall".into(), value);
                }
            }
            return Ok(());
        }
        Err(format!("unknown state version {from}"))
    }
}

/// Register the plugin with the library's entry point.
pub fn register(entry: &mut EntryPoint) {
    entry.register(PluginEntry::new(&CONFIG, || Box::new(Sines)));
}
