//! Parameter value formatting and parsing.
//!
//! [`Formatter`] converts plain numeric values to display text and back.
//! Like the host-facing parameter info, the bare value text and the unit are
//! kept apart:
//! - `text()` returns the value without units (e.g., "0.250", "-6.000")
//! - `unit()` returns the formatter's unit string (e.g., "%", "dB")
//!
//! [`ParameterDescriptor::value_to_text`](crate::ParameterDescriptor::value_to_text)
//! joins the two for the host.
//!
//! # Example
//!
//! ```
//! use trellis_core::Formatter;
//!
//! let fmt = Formatter::Decibels { precision: 1 };
//! assert_eq!(fmt.text(-6.0), "-6.0");
//! assert_eq!(fmt.unit(), "dB");
//!
//! let fmt = Formatter::Percent { precision: 2 };
//! assert_eq!(fmt.text(0.5), "50.00");
//! assert_eq!(fmt.parse("25%"), Some(0.25));
//! ```

/// Numeric value formatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formatter {
    /// Generic float with configurable precision (e.g., "0.010").
    Float {
        /// Number of decimal places.
        precision: usize,
    },

    /// Percentage. Input is 0.0-1.0, display is 0-100.
    Percent {
        /// Number of decimal places.
        precision: usize,
    },

    /// Level in decibels; the plain value is already in dB.
    Decibels {
        /// Number of decimal places.
        precision: usize,
    },
}

impl Formatter {
    /// Convert a plain value to a display string (without unit).
    pub fn text(&self, value: f64) -> String {
        match self {
            Formatter::Float { precision } | Formatter::Decibels { precision } => {
                format!("{:.prec$}", value, prec = *precision)
            }

            Formatter::Percent { precision } => {
                format!("{:.prec$}", value * 100.0, prec = *precision)
            }
        }
    }

    /// Parse a display string to a plain value.
    ///
    /// Accepts the value with or without its unit. Returns `None` if the
    /// string is not a number.
    pub fn parse(&self, s: &str) -> Option<f64> {
        let s = s.trim();

        match self {
            Formatter::Float { .. } => s.parse().ok(),

            Formatter::Percent { .. } => {
                let trimmed = s.trim_end_matches('%').trim();
                trimmed.parse::<f64>().ok().map(|v| v / 100.0)
            }

            Formatter::Decibels { .. } => {
                let trimmed = s
                    .trim_end_matches("dB")
                    .trim_end_matches("db")
                    .trim();
                trimmed.parse().ok()
            }
        }
    }

    /// Get the unit string for this formatter.
    pub fn unit(&self) -> &'static str {
        match self {
            Formatter::Float { .. } => "",
            Formatter::Percent { .. } => "%",
            Formatter::Decibels { .. } => "dB",
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Float { precision: 3 }
    }
}
