//! Effect parameters.
//!
//! [`EffectParameters`] is the flat value object the pipeline consumes. Every
//! field has a no-op value, and [`Default`] yields the all-no-op set, so a
//! preset file only names the effects it wants:
//!
//! ```yaml
//! blur_radius: 4
//! tint_color: "#3060c0"
//! tint_opacity: 0.35
//! center_clarity: true
//! ```

use crate::resize::Filter;
use crate::{grain, OpsError, OpsResult};
use atmos_core::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default downscale bound for the working image.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// Default wave period divisor.
pub const DEFAULT_DISTORTION_FREQUENCY: f32 = 20.0;

/// Parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectParameters {
    /// Blur radius in pixels (0 = off).
    pub blur_radius: f32,
    /// Saturation on the 100 = unchanged scale.
    pub saturation_percent: f32,
    /// Brightness on the 100 = unchanged scale.
    pub brightness_percent: f32,
    /// Tint overlay color.
    pub tint_color: Rgb,
    /// Tint overlay opacity in `[0, 1]` (0 = off).
    pub tint_opacity: f32,
    /// Maximum grain offset per pixel (0 = off).
    pub noise_intensity: f32,
    /// Wave displacement in pixels (0 = off).
    pub distortion_amplitude: f32,
    /// Wave period divisor; must be positive when the wave is on.
    pub distortion_frequency: f32,
    /// Blend the unprocessed image back in around the center.
    pub center_clarity: bool,
    /// Falloff radius override for center clarity.
    pub clarity_radius: Option<f32>,
    /// Longest side of the working image.
    pub max_dimension: u32,
    /// Filter used by the downscale stage.
    pub resample: Filter,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            blur_radius: 0.0,
            saturation_percent: 100.0,
            brightness_percent: 100.0,
            tint_color: Rgb::WHITE,
            tint_opacity: 0.0,
            noise_intensity: 0.0,
            distortion_amplitude: 0.0,
            distortion_frequency: DEFAULT_DISTORTION_FREQUENCY,
            center_clarity: false,
            clarity_radius: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
            resample: Filter::default(),
        }
    }
}

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Limit the working resolution.
    Downscale,
    /// Two-axis sine wave resample.
    Distortion,
    /// Monochrome grain.
    Noise,
    /// Gaussian-like blur.
    Blur,
    /// Saturation and brightness.
    Adjust,
    /// "Color" blend overlay.
    Tint,
    /// Radial blend back to the unprocessed frame.
    CenterClarity,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 7] = [
        Stage::Downscale,
        Stage::Distortion,
        Stage::Noise,
        Stage::Blur,
        Stage::Adjust,
        Stage::Tint,
        Stage::CenterClarity,
    ];

    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Downscale => "downscale",
            Stage::Distortion => "distortion",
            Stage::Noise => "noise",
            Stage::Blur => "blur",
            Stage::Adjust => "brightness/saturation",
            Stage::Tint => "tint",
            Stage::CenterClarity => "center clarity",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn finite(name: &str, v: f32) -> OpsResult<f32> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(OpsError::InvalidParameter(format!("{name} must be finite, got {v}")))
    }
}

impl EffectParameters {
    /// Returns a normalized copy that the pipeline can run as-is.
    ///
    /// Negative magnitudes clamp to 0, opacity clamps to `[0, 1]` and noise
    /// intensity is capped at [`grain::MAX_INTENSITY`].
    ///
    /// # Errors
    ///
    /// Non-finite values, a zero `max_dimension`, and a non-positive
    /// frequency while the wave is on are rejected.
    pub fn validated(&self) -> OpsResult<Self> {
        let mut p = self.clone();
        p.blur_radius = finite("blur_radius", p.blur_radius)?.max(0.0);
        p.saturation_percent = finite("saturation_percent", p.saturation_percent)?.max(0.0);
        p.brightness_percent = finite("brightness_percent", p.brightness_percent)?.max(0.0);
        p.tint_opacity = finite("tint_opacity", p.tint_opacity)?.clamp(0.0, 1.0);
        p.noise_intensity = finite("noise_intensity", p.noise_intensity)?.clamp(0.0, grain::MAX_INTENSITY);
        p.distortion_amplitude = finite("distortion_amplitude", p.distortion_amplitude)?.max(0.0);
        p.distortion_frequency = finite("distortion_frequency", p.distortion_frequency)?;
        if let Some(r) = p.clarity_radius {
            p.clarity_radius = Some(finite("clarity_radius", r)?.max(0.0));
        }

        if p.distortion_amplitude > 0.0 && p.distortion_frequency <= 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "distortion_frequency must be > 0 when distortion is on, got {}",
                p.distortion_frequency
            )));
        }
        if p.max_dimension == 0 {
            return Err(OpsError::InvalidParameter("max_dimension must be > 0".into()));
        }
        Ok(p)
    }

    /// Whether `stage` does any work with these parameters.
    pub fn is_active(&self, stage: Stage) -> bool {
        match stage {
            Stage::Downscale => true,
            Stage::Distortion => self.distortion_amplitude > 0.0,
            Stage::Noise => self.noise_intensity > 0.0,
            Stage::Blur => self.blur_radius > 0.0,
            Stage::Adjust => self.saturation_percent != 100.0 || self.brightness_percent != 100.0,
            Stage::Tint => self.tint_opacity > 0.0,
            Stage::CenterClarity => self.center_clarity,
        }
    }

    /// Active stages in execution order.
    pub fn stages(&self) -> Vec<Stage> {
        Stage::ALL.into_iter().filter(|&s| self.is_active(s)).collect()
    }

    /// True if only the downscale stage would run.
    pub fn is_noop(&self) -> bool {
        self.stages() == [Stage::Downscale]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_noop() {
        let p = EffectParameters::default();
        assert!(p.is_noop());
        assert_eq!(p.validated().unwrap(), p);
    }

    #[test]
    fn test_stage_selection() {
        let p = EffectParameters {
            blur_radius: 2.0,
            tint_opacity: 0.3,
            center_clarity: true,
            ..Default::default()
        };
        assert_eq!(
            p.stages(),
            vec![Stage::Downscale, Stage::Blur, Stage::Tint, Stage::CenterClarity]
        );

        let p = EffectParameters { brightness_percent: 120.0, ..Default::default() };
        assert!(p.is_active(Stage::Adjust));
    }

    #[test]
    fn test_validated_clamps() {
        let p = EffectParameters {
            blur_radius: -3.0,
            tint_opacity: 1.7,
            noise_intensity: -1.0,
            clarity_radius: Some(-4.0),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(p.blur_radius, 0.0);
        assert_eq!(p.tint_opacity, 1.0);
        assert_eq!(p.noise_intensity, 0.0);
        assert_eq!(p.clarity_radius, Some(0.0));

        let loud = EffectParameters { noise_intensity: f32::MAX, ..Default::default() };
        assert_eq!(loud.validated().unwrap().noise_intensity, grain::MAX_INTENSITY);
    }

    #[test]
    fn test_validated_rejects() {
        let nan = EffectParameters { blur_radius: f32::NAN, ..Default::default() };
        assert!(nan.validated().is_err());

        let inf = EffectParameters { saturation_percent: f32::INFINITY, ..Default::default() };
        assert!(inf.validated().is_err());

        let freq = EffectParameters {
            distortion_amplitude: 4.0,
            distortion_frequency: 0.0,
            ..Default::default()
        };
        assert!(freq.validated().is_err());

        let bound = EffectParameters { max_dimension: 0, ..Default::default() };
        assert!(bound.validated().is_err());
    }

    #[test]
    fn test_zero_frequency_allowed_without_wave() {
        let p = EffectParameters { distortion_frequency: 0.0, ..Default::default() };
        assert!(p.validated().is_ok());
    }

    #[test]
    fn test_yaml_preset_partial() {
        let yaml = "blur_radius: 4\ntint_color: \"#3060c0\"\ntint_opacity: 0.35\nresample: lanczos3\n";
        let p: EffectParameters = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(p.blur_radius, 4.0);
        assert_eq!(p.tint_color, Rgb::new(0x30, 0x60, 0xc0));
        assert_eq!(p.resample, Filter::Lanczos3);
        assert_eq!(p.saturation_percent, 100.0);
        assert_eq!(p.max_dimension, DEFAULT_MAX_DIMENSION);
    }

    #[test]
    fn test_yaml_rejects_unknown_field() {
        assert!(serde_yaml::from_str::<EffectParameters>("blurr: 3\n").is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let p = EffectParameters {
            noise_intensity: 8.0,
            center_clarity: true,
            clarity_radius: Some(120.0),
            ..Default::default()
        };
        let text = serde_yaml::to_string(&p).unwrap();
        let back: EffectParameters = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, p);
    }
}
