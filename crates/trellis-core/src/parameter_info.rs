//! Parameter metadata types.
//!
//! This module provides types for describing parameter metadata:
//! - [`ParameterDescriptor`] - Complete parameter description (kind, range, default, display)
//! - [`ParameterKind`] - Value domain and display rules
//! - [`ParameterFlags`] - Behavioral flags (automation, modulation, stepping)
//! - [`ParameterInfo`] - Fixed-shape snapshot handed to the host
//!
//! Every parameter exposes a *raw* value to the host. For numeric kinds the
//! raw range is `0.0..=1.0`, mapped through a [`Curve`] onto the plain
//! `min..=max`. Integer and enumerated kinds use their plain range directly,
//! so the raw value is the integer or the label index.

use crate::parameter_format::Formatter;
use crate::parameter_range::Curve;

/// Parameter identifier. Dense, zero-based index into the registry.
pub type ParameterId = u32;

/// Flags controlling parameter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterFlags {
    /// Parameter can be automated by the host.
    pub automatable: bool,
    /// Parameter accepts per-block modulation offsets.
    pub modulatable: bool,
    /// Parameter only takes whole-number raw values.
    pub stepped: bool,
    /// Parameter should be displayed as a list of labels.
    pub is_enum: bool,
    /// Parameter is read-only (display only).
    pub readonly: bool,
    /// Parameter is hidden from the DAW's parameter list.
    pub hidden: bool,
}

impl Default for ParameterFlags {
    fn default() -> Self {
        Self {
            automatable: true,
            modulatable: false,
            stepped: false,
            is_enum: false,
            readonly: false,
            hidden: false,
        }
    }
}

/// Value domain of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// Continuous value. Raw range is 0..1, curved onto `min..=max`.
    Numeric {
        min: f64,
        max: f64,
        curve: Curve,
        formatter: Formatter,
        /// Overrides the formatter's unit when set.
        unit: Option<String>,
    },
    /// Whole numbers. Raw range is `min..=max`.
    Integer {
        min: i32,
        max: i32,
        /// Plural unit, e.g. "voices".
        unit: String,
        /// Unit used when the value is exactly one, e.g. "voice".
        unit_singular: String,
    },
    /// A list of labels. Raw value is the label index.
    Enumerated { labels: Vec<String> },
}

/// Complete description of one parameter.
///
/// Built with one of the kind constructors and refined with the `with_*`
/// methods, then handed to
/// [`ParameterRegistry::configure`](crate::ParameterRegistry::configure),
/// which assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Registry slot. Assigned on registration.
    pub id: ParameterId,
    /// Stable string key, used by the TOML state format.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Module path for grouping in host UIs (e.g. "Filter/Env").
    pub module: String,
    /// Value domain and display rules.
    pub kind: ParameterKind,
    /// Default in plain units (value, integer or label index).
    pub default: f64,
    /// Behavioral flags.
    pub flags: ParameterFlags,
}

impl ParameterDescriptor {
    fn with_kind(key: &str, name: &str, kind: ParameterKind, default: f64) -> Self {
        Self {
            id: 0,
            key: key.to_owned(),
            name: name.to_owned(),
            module: String::new(),
            kind,
            default,
            flags: ParameterFlags::default(),
        }
    }

    /// Continuous parameter over `min..=max`, shown as `"{:.3}"`.
    pub fn numeric(key: &str, name: &str, min: f64, max: f64, default: f64) -> Self {
        Self::with_kind(
            key,
            name,
            ParameterKind::Numeric {
                min,
                max,
                curve: Curve::Linear,
                formatter: Formatter::default(),
                unit: None,
            },
            default,
        )
    }

    /// Continuous 0..1 parameter shown as a percentage ("50.00%").
    pub fn percent(key: &str, name: &str, default: f64) -> Self {
        Self::numeric(key, name, 0.0, 1.0, default).with_formatter(Formatter::Percent { precision: 2 })
    }

    /// Level in decibels over `min..=max`.
    pub fn decibels(key: &str, name: &str, min: f64, max: f64, default: f64) -> Self {
        Self::numeric(key, name, min, max, default).with_formatter(Formatter::Decibels { precision: 3 })
    }

    /// Whole-number parameter over `min..=max`.
    pub fn integer(key: &str, name: &str, min: i32, max: i32, default: i32) -> Self {
        let mut descriptor = Self::with_kind(
            key,
            name,
            ParameterKind::Integer {
                min,
                max,
                unit: String::new(),
                unit_singular: String::new(),
            },
            f64::from(default),
        );
        descriptor.flags.stepped = true;
        descriptor
    }

    /// Choice between labels. `default` is a label index.
    pub fn enumerated<S: AsRef<str>>(key: &str, name: &str, labels: &[S], default: usize) -> Self {
        let labels = labels.iter().map(|s| s.as_ref().to_owned()).collect();
        let mut descriptor = Self::with_kind(
            key,
            name,
            ParameterKind::Enumerated { labels },
            default as f64,
        );
        descriptor.flags.stepped = true;
        descriptor.flags.is_enum = true;
        descriptor
    }

    /// Two-state switch with labels "Off" and "On".
    pub fn on_off(key: &str, name: &str, default: bool) -> Self {
        Self::enumerated(key, name, &["Off", "On"], usize::from(default))
    }

    /// Set the response curve (numeric kinds only).
    pub fn with_curve(mut self, new_curve: Curve) -> Self {
        if let ParameterKind::Numeric { curve, .. } = &mut self.kind {
            *curve = new_curve;
        }
        self
    }

    /// Set the value formatter (numeric kinds only).
    pub fn with_formatter(mut self, new_formatter: Formatter) -> Self {
        if let ParameterKind::Numeric { formatter, .. } = &mut self.kind {
            *formatter = new_formatter;
        }
        self
    }

    /// Set the unit label. Integer kinds use it for every value except one.
    pub fn with_unit(mut self, new_unit: &str) -> Self {
        match &mut self.kind {
            ParameterKind::Numeric { unit, .. } => *unit = Some(new_unit.to_owned()),
            ParameterKind::Integer { unit, .. } => *unit = new_unit.to_owned(),
            ParameterKind::Enumerated { .. } => {}
        }
        self
    }

    /// Set the singular unit label (integer kinds only).
    pub fn with_unit_singular(mut self, singular: &str) -> Self {
        if let ParameterKind::Integer { unit_singular, .. } = &mut self.kind {
            *unit_singular = singular.to_owned();
        }
        self
    }

    /// Set the module path.
    pub fn with_module(mut self, module: &str) -> Self {
        self.module = module.to_owned();
        self
    }

    /// Set parameter flags.
    pub fn with_flags(mut self, flags: ParameterFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark the parameter as accepting modulation.
    pub fn modulatable(mut self) -> Self {
        self.flags.modulatable = true;
        self
    }

    /// Smallest raw value.
    pub fn raw_min(&self) -> f64 {
        match &self.kind {
            ParameterKind::Numeric { .. } => 0.0,
            ParameterKind::Integer { min, .. } => f64::from(*min),
            ParameterKind::Enumerated { .. } => 0.0,
        }
    }

    /// Largest raw value.
    pub fn raw_max(&self) -> f64 {
        match &self.kind {
            ParameterKind::Numeric { .. } => 1.0,
            ParameterKind::Integer { max, .. } => f64::from(*max),
            ParameterKind::Enumerated { labels } => labels.len().saturating_sub(1) as f64,
        }
    }

    /// Default as a raw value.
    pub fn raw_default(&self) -> f64 {
        self.from_plain(self.default)
    }

    /// Clamp a raw value into this parameter's raw range. NaN maps to the
    /// minimum.
    pub fn clamp_raw(&self, raw: f64) -> f64 {
        raw.max(self.raw_min()).min(self.raw_max())
    }

    /// Check that the bounds and default describe a usable range.
    pub fn check(&self) -> Result<(), String> {
        if !self.default.is_finite() {
            return Err(format!("default {} is not finite", self.default));
        }
        match &self.kind {
            ParameterKind::Numeric { min, max, .. } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(format!("range {min}..{max} is not finite"));
                }
                if min > max {
                    return Err(format!("minimum {min} is above maximum {max}"));
                }
            }
            ParameterKind::Integer { min, max, .. } => {
                if min > max {
                    return Err(format!("minimum {min} is above maximum {max}"));
                }
            }
            ParameterKind::Enumerated { labels } => {
                if labels.is_empty() {
                    return Err("no labels".into());
                }
            }
        }
        Ok(())
    }

    /// Convert a raw value to plain units.
    pub fn to_plain(&self, raw: f64) -> f64 {
        match &self.kind {
            ParameterKind::Numeric { min, max, curve, .. } => {
                let curved = curve.to_curved(raw.clamp(0.0, 1.0));
                let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
                (min + (max - min) * curved).clamp(lo, hi)
            }
            ParameterKind::Integer { .. } | ParameterKind::Enumerated { .. } => {
                self.clamp_raw(raw.round())
            }
        }
    }

    /// Convert a plain value to a raw value.
    pub fn from_plain(&self, plain: f64) -> f64 {
        match &self.kind {
            ParameterKind::Numeric { min, max, curve, .. } => {
                let range = max - min;
                if range == 0.0 {
                    return 0.0;
                }
                curve.from_curved(((plain - min) / range).clamp(0.0, 1.0))
            }
            ParameterKind::Integer { .. } | ParameterKind::Enumerated { .. } => {
                self.clamp_raw(plain.round())
            }
        }
    }

    /// Raw value as an integer in `min..=max`.
    pub fn to_integer(&self, raw: f64) -> i32 {
        self.to_plain(raw) as i32
    }

    /// Raw value as a label index, clamped to the label count.
    pub fn to_index(&self, raw: f64) -> usize {
        self.to_plain(raw).max(0.0) as usize
    }

    /// Raw value as a switch state.
    pub fn to_bool(&self, raw: f64) -> bool {
        self.to_plain(raw) >= 0.5
    }

    /// Host-facing text for a raw value.
    pub fn value_to_text(&self, raw: f64) -> String {
        match &self.kind {
            ParameterKind::Numeric {
                formatter, unit, ..
            } => {
                let text = formatter.text(self.to_plain(raw));
                let unit = unit.as_deref().unwrap_or(formatter.unit());
                match unit {
                    "" => text,
                    "%" => format!("{text}%"),
                    unit => format!("{text} {unit}"),
                }
            }
            ParameterKind::Integer {
                unit,
                unit_singular,
                ..
            } => {
                let value = self.to_integer(raw);
                let unit = if value == 1 && !unit_singular.is_empty() {
                    unit_singular
                } else {
                    unit
                };
                if unit.is_empty() {
                    value.to_string()
                } else {
                    format!("{value} {unit}")
                }
            }
            ParameterKind::Enumerated { labels } => labels
                .get(self.to_index(raw))
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Parse host text into a raw value. Returns `None` for unparseable text.
    pub fn text_to_value(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        match &self.kind {
            ParameterKind::Numeric {
                formatter, unit, ..
            } => {
                let bare = match unit {
                    Some(unit) if !unit.is_empty() => {
                        text.strip_suffix(unit.as_str()).unwrap_or(text).trim()
                    }
                    _ => text,
                };
                formatter.parse(bare).map(|plain| self.from_plain(plain))
            }
            ParameterKind::Integer { .. } => {
                let number = text.split_whitespace().next()?;
                let value: f64 = number.parse().ok()?;
                Some(self.from_plain(value.trunc()))
            }
            ParameterKind::Enumerated { labels } => {
                if let Some(index) = labels.iter().position(|l| l.eq_ignore_ascii_case(text)) {
                    return Some(index as f64);
                }
                let index: f64 = text.parse().ok()?;
                Some(self.from_plain(index))
            }
        }
    }

    /// Fixed-shape snapshot for the host.
    pub fn info(&self) -> ParameterInfo {
        ParameterInfo {
            id: self.id,
            name: self.name.clone(),
            module: self.module.clone(),
            min: self.raw_min(),
            max: self.raw_max(),
            default: self.raw_default(),
            flags: self.flags,
        }
    }
}

/// Parameter description as the host sees it. All values are raw.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub id: ParameterId,
    pub name: String,
    pub module: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub flags: ParameterFlags,
}
