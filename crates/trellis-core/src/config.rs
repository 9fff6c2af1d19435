//! Plugin configuration.
//!
//! Static descriptor the factory hands to the host before any instance
//! exists: stable id, display name, category and feature tags.
//!
//! # Example
//!
//! ```
//! use trellis_core::config::{Category, Config, Feature};
//!
//! pub static CONFIG: Config = Config::new("com.example.sines", "Sines", Category::Instrument)
//!     .with_vendor("Example Audio")
//!     .with_version("1.0.0")
//!     .with_features(&[Feature::Synthesizer, Feature::Stereo]);
//!
//! assert_eq!(CONFIG.features(), vec!["instrument", "synthesizer", "stereo"]);
//! ```

/// Plugin type. Determines how hosts categorize and use the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Virtual instrument (synth, sampler, drum machine)
    Instrument,
    /// Audio effect (EQ, compressor, reverb, delay)
    Effect,
    /// Note processor (arpeggiator, chord generator)
    NoteEffect,
    /// Metering and analysis
    Analyzer,
}

impl Category {
    /// Host feature tag for the category.
    pub const fn tag(&self) -> &'static str {
        match self {
            Category::Instrument => "instrument",
            Category::Effect => "audio-effect",
            Category::NoteEffect => "note-effect",
            Category::Analyzer => "analyzer",
        }
    }

    /// Check if this type accepts note input
    pub const fn accepts_notes(&self) -> bool {
        matches!(self, Category::Instrument | Category::NoteEffect)
    }
}

/// Additional feature tags for more specific classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Synthesizer,
    Sampler,
    Drum,
    Filter,
    Delay,
    Reverb,
    Distortion,
    Utility,
    Mono,
    Stereo,
}

impl Feature {
    /// Host feature tag string.
    pub const fn tag(&self) -> &'static str {
        match self {
            Feature::Synthesizer => "synthesizer",
            Feature::Sampler => "sampler",
            Feature::Drum => "drum",
            Feature::Filter => "filter",
            Feature::Delay => "delay",
            Feature::Reverb => "reverb",
            Feature::Distortion => "distortion",
            Feature::Utility => "utility",
            Feature::Mono => "mono",
            Feature::Stereo => "stereo",
        }
    }
}

/// Static plugin descriptor.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stable reverse-domain identifier. Persisted state is keyed on it.
    pub id: &'static str,

    /// Plugin name displayed in the DAW.
    pub name: &'static str,

    /// Plugin category (effect, instrument, etc.)
    pub category: Category,

    /// Vendor/company name.
    pub vendor: &'static str,

    /// Vendor URL.
    pub url: &'static str,

    /// Plugin version string.
    pub version: &'static str,

    /// One-line description.
    pub description: &'static str,

    /// Feature tags beyond the category.
    pub features: &'static [Feature],
}

impl Config {
    /// Create a new config with the required fields.
    pub const fn new(id: &'static str, name: &'static str, category: Category) -> Self {
        Self {
            id,
            name,
            category,
            vendor: "",
            url: "",
            version: "0.0.0",
            description: "",
            features: &[],
        }
    }

    /// Set the vendor name.
    pub const fn with_vendor(mut self, vendor: &'static str) -> Self {
        self.vendor = vendor;
        self
    }

    /// Set the vendor URL.
    pub const fn with_url(mut self, url: &'static str) -> Self {
        self.url = url;
        self
    }

    /// Set the version string.
    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    /// Set the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set the feature tags.
    pub const fn with_features(mut self, features: &'static [Feature]) -> Self {
        self.features = features;
        self
    }

    /// All host feature tags: the category first, then the features.
    pub fn features(&self) -> Vec<&'static str> {
        std::iter::once(self.category.tag())
            .chain(self.features.iter().map(Feature::tag))
            .collect()
    }
}
