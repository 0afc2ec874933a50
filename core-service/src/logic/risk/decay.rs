//! Risk decay
//!
//! Decay is the only way risk goes down. Every function satisfies
//! factor(0) = 1, is non-increasing, and tends to 0.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::logic::clock::duration_secs;
use crate::logic::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayPoint {
    pub after_secs: f64,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecayConfig {
    /// Score halves every `half_life_secs`
    Exponential { half_life_secs: f64 },
    /// Falls linearly to 0 at `zero_after_secs`
    Linear { zero_after_secs: f64 },
    /// Piecewise-linear through (0, 1) and the given points
    Table { points: Vec<DecayPoint> },
}

impl Default for DecayConfig {
    fn default() -> Self {
        DecayConfig::Exponential { half_life_secs: 300.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecayPolicy {
    function: DecayConfig,
    grace_secs: f64,
}

impl DecayPolicy {
    pub fn compile(config: &DecayConfig, grace_secs: f64) -> Result<Self, ConfigError> {
        if !grace_secs.is_finite() || grace_secs < 0.0 {
            return Err(ConfigError::InvalidDecay(format!("grace_secs must be >= 0, got {}", grace_secs)));
        }

        match config {
            DecayConfig::Exponential { half_life_secs } => {
                if !half_life_secs.is_finite() || *half_life_secs <= 0.0 {
                    return Err(ConfigError::InvalidDecay(format!(
                        "half_life_secs must be > 0, got {}",
                        half_life_secs
                    )));
                }
            }
            DecayConfig::Linear { zero_after_secs } => {
                if !zero_after_secs.is_finite() || *zero_after_secs <= 0.0 {
                    return Err(ConfigError::InvalidDecay(format!(
                        "zero_after_secs must be > 0, got {}",
                        zero_after_secs
                    )));
                }
            }
            DecayConfig::Table { points } => validate_table(points)?,
        }

        Ok(Self {
            function: config.clone(),
            grace_secs,
        })
    }

    /// Multiplier for a score left alone for `elapsed_secs`
    pub fn factor(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs.is_nan() || elapsed_secs <= self.grace_secs {
            return 1.0;
        }
        let t = elapsed_secs - self.grace_secs;

        let f = match &self.function {
            DecayConfig::Exponential { half_life_secs } => 0.5f64.powf(t / half_life_secs),
            DecayConfig::Linear { zero_after_secs } => 1.0 - t / zero_after_secs,
            DecayConfig::Table { points } => table_factor(points, t),
        };
        f.clamp(0.0, 1.0)
    }

    pub fn apply(&self, score: f64, elapsed: Duration) -> f64 {
        score * self.factor(duration_secs(elapsed).max(0.0))
    }

    pub fn grace_secs(&self) -> f64 {
        self.grace_secs
    }

    pub fn function(&self) -> &DecayConfig {
        &self.function
    }
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            function: DecayConfig::default(),
            grace_secs: 0.0,
        }
    }
}

fn validate_table(points: &[DecayPoint]) -> Result<(), ConfigError> {
    if points.is_empty() {
        return Err(ConfigError::InvalidDecay("decay table needs at least one point".to_string()));
    }

    let mut prev_after = 0.0;
    let mut prev_factor = 1.0;
    for p in points {
        if !p.after_secs.is_finite() || p.after_secs <= prev_after {
            return Err(ConfigError::InvalidDecay(format!(
                "decay table after_secs must be strictly increasing and > 0 (at {})",
                p.after_secs
            )));
        }
        if !(0.0..=1.0).contains(&p.factor) {
            return Err(ConfigError::InvalidDecay(format!("decay factor {} outside [0, 1]", p.factor)));
        }
        if p.factor > prev_factor {
            return Err(ConfigError::InvalidDecay(format!(
                "decay table is not non-increasing at {}s ({} > {})",
                p.after_secs, p.factor, prev_factor
            )));
        }
        prev_after = p.after_secs;
        prev_factor = p.factor;
    }

    if prev_factor != 0.0 {
        return Err(ConfigError::InvalidDecay("decay table must end at factor 0".to_string()));
    }
    Ok(())
}

fn table_factor(points: &[DecayPoint], t: f64) -> f64 {
    let (mut x0, mut y0) = (0.0, 1.0);
    for p in points {
        if t <= p.after_secs {
            let span = p.after_secs - x0;
            return y0 + (p.factor - y0) * ((t - x0) / span);
        }
        x0 = p.after_secs;
        y0 = p.factor;
    }
    y0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(half_life: f64) -> DecayPolicy {
        DecayPolicy::compile(&DecayConfig::Exponential { half_life_secs: half_life }, 0.0).unwrap()
    }

    #[test]
    fn test_factor_at_zero_is_one() {
        assert_eq!(exp(300.0).factor(0.0), 1.0);
        let linear = DecayPolicy::compile(&DecayConfig::Linear { zero_after_secs: 60.0 }, 0.0).unwrap();
        assert_eq!(linear.factor(0.0), 1.0);
    }

    #[test]
    fn test_exponential_half_life() {
        let d = exp(300.0);
        assert!((d.factor(300.0) - 0.5).abs() < 1e-12);
        assert!((d.factor(600.0) - 0.25).abs() < 1e-12);
        assert!(d.factor(1e9) < 1e-12);
    }

    #[test]
    fn test_linear_reaches_zero() {
        let d = DecayPolicy::compile(&DecayConfig::Linear { zero_after_secs: 100.0 }, 0.0).unwrap();
        assert!((d.factor(50.0) - 0.5).abs() < 1e-12);
        assert_eq!(d.factor(100.0), 0.0);
        assert_eq!(d.factor(1000.0), 0.0);
    }

    #[test]
    fn test_table_interpolates() {
        let points = vec![
            DecayPoint { after_secs: 60.0, factor: 0.8 },
            DecayPoint { after_secs: 120.0, factor: 0.2 },
            DecayPoint { after_secs: 180.0, factor: 0.0 },
        ];
        let d = DecayPolicy::compile(&DecayConfig::Table { points }, 0.0).unwrap();

        assert!((d.factor(30.0) - 0.9).abs() < 1e-12);
        assert!((d.factor(90.0) - 0.5).abs() < 1e-12);
        assert_eq!(d.factor(500.0), 0.0);
    }

    #[test]
    fn test_table_validation() {
        let rising = vec![
            DecayPoint { after_secs: 60.0, factor: 0.5 },
            DecayPoint { after_secs: 120.0, factor: 0.7 },
            DecayPoint { after_secs: 180.0, factor: 0.0 },
        ];
        assert!(matches!(
            DecayPolicy::compile(&DecayConfig::Table { points: rising }, 0.0),
            Err(ConfigError::InvalidDecay(_))
        ));

        let no_floor = vec![DecayPoint { after_secs: 60.0, factor: 0.5 }];
        assert!(DecayPolicy::compile(&DecayConfig::Table { points: no_floor }, 0.0).is_err());

        let unordered = vec![
            DecayPoint { after_secs: 120.0, factor: 0.5 },
            DecayPoint { after_secs: 60.0, factor: 0.0 },
        ];
        assert!(DecayPolicy::compile(&DecayConfig::Table { points: unordered }, 0.0).is_err());

        assert!(DecayPolicy::compile(&DecayConfig::Table { points: vec![] }, 0.0).is_err());
    }

    #[test]
    fn test_grace_period() {
        let d = DecayPolicy::compile(&DecayConfig::Exponential { half_life_secs: 100.0 }, 30.0).unwrap();
        assert_eq!(d.factor(30.0), 1.0);
        assert!((d.factor(130.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_increasing() {
        let d = exp(120.0);
        let mut prev = 1.0;
        for i in 0..1000 {
            let f = d.factor(i as f64 * 3.7);
            assert!(f <= prev);
            prev = f;
        }
    }

    #[test]
    fn test_negative_elapsed_does_not_grow() {
        assert_eq!(exp(300.0).apply(0.4, Duration::seconds(-10)), 0.4);
    }

    #[test]
    fn test_config_serde() {
        let json = r#"{"kind":"linear","zero_after_secs":600}"#;
        let cfg: DecayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg, DecayConfig::Linear { zero_after_secs: 600.0 });
    }
}
