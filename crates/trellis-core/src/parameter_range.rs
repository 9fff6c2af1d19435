//! Response curves for numeric parameters.
//!
//! Numeric parameters are exposed to the host on a 0..1 raw range. A
//! [`Curve`] reshapes that range before it is mapped onto the parameter's
//! plain `min..=max`, so controls can have exponential or centred response.

/// Mapping between the linear host range and the curved parameter range.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum Curve {
    /// Identity mapping.
    #[default]
    Linear,
    /// `x^k`; values of `k > 1` give finer control near the bottom.
    Power(f64),
    /// Power curve mirrored around the centre, for bipolar controls.
    BipolarPower(f64),
}

impl Curve {
    /// Apply the curve to a linear 0..1 value.
    pub fn to_curved(&self, x: f64) -> f64 {
        match *self {
            Curve::Linear => x,
            Curve::Power(k) => x.clamp(0.0, 1.0).powf(k).clamp(0.0, 1.0),
            Curve::BipolarPower(k) => {
                let centred = 2.0 * (x - 0.5);
                let shaped = centred.abs().powf(k).copysign(centred);
                (shaped * 0.5 + 0.5).clamp(0.0, 1.0)
            }
        }
    }

    /// Invert [`Curve::to_curved`].
    pub fn from_curved(&self, y: f64) -> f64 {
        match *self {
            Curve::Linear => y,
            Curve::Power(k) => y.clamp(0.0, 1.0).powf(1.0 / k).clamp(0.0, 1.0),
            Curve::BipolarPower(k) => {
                let centred = 2.0 * (y - 0.5);
                let shaped = centred.abs().powf(1.0 / k).copysign(centred);
                (shaped * 0.5 + 0.5).clamp(0.0, 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity() {
        assert_eq!(Curve::Linear.to_curved(0.25), 0.25);
        assert_eq!(Curve::Linear.from_curved(0.75), 0.75);
    }

    #[test]
    fn test_power_curve_inverts() {
        let curve = Curve::Power(3.0);
        assert!((curve.to_curved(0.5) - 0.125).abs() < 1e-12);
        assert!((curve.from_curved(curve.to_curved(0.4)) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_bipolar_keeps_centre_and_ends() {
        let curve = Curve::BipolarPower(2.0);
        assert!((curve.to_curved(0.5) - 0.5).abs() < 1e-12);
        assert!((curve.to_curved(0.0) - 0.0).abs() < 1e-12);
        assert!((curve.to_curved(1.0) - 1.0).abs() < 1e-12);
        assert!((curve.from_curved(curve.to_curved(0.8)) - 0.8).abs() < 1e-9);
    }
}
