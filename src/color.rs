//! Value-to-color mapping for the grid visualizations.
//!
//! The engine itself never reads colors. The view layer holds a [`ProfileStore`] and
//! subscribes to it to learn when the active [`ColorProfile`] changes.

use crossbeam::channel::{self, Receiver, Sender};
use palette::{Mix, Srgb, Srgba, WithAlpha};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileName {
    Default,
    Projector,
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileName::Default => write!(f, "default"),
            ProfileName::Projector => write!(f, "projector"),
        }
    }
}

/// Palette used by the grid and line visualizations.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorProfile {
    pub name: ProfileName,
    pub background: Srgb<u8>,
    pub potential_zero: Srgb<u8>,
    pub potential_positive: Srgb<u8>,
    pub potential_negative: Srgb<u8>,
    pub field_zero: Srgb<u8>,
    pub field_saturation: Srgb<u8>,
    pub equipotential_line: Srgb<u8>,
    pub field_line: Srgb<u8>,
}

impl ColorProfile {
    /// Dark background for screens.
    pub fn standard() -> Self {
        Self {
            name: ProfileName::Default,
            background: Srgb::new(0, 0, 0),
            potential_zero: Srgb::new(0, 0, 0),
            potential_positive: Srgb::new(210, 0, 0),
            potential_negative: Srgb::new(0, 0, 210),
            field_zero: Srgb::new(0, 0, 0),
            field_saturation: Srgb::new(255, 255, 255),
            equipotential_line: Srgb::new(50, 255, 100),
            field_line: Srgb::new(255, 155, 0),
        }
    }

    /// Light background for classroom projectors.
    pub fn projector() -> Self {
        Self {
            name: ProfileName::Projector,
            background: Srgb::new(255, 255, 255),
            potential_zero: Srgb::new(255, 255, 255),
            potential_positive: Srgb::new(255, 0, 0),
            potential_negative: Srgb::new(0, 0, 255),
            field_zero: Srgb::new(255, 255, 255),
            field_saturation: Srgb::new(0, 0, 0),
            equipotential_line: Srgb::new(0, 0, 0),
            field_line: Srgb::new(120, 60, 0),
        }
    }

    pub fn from_name(name: ProfileName) -> Self {
        match name {
            ProfileName::Default => Self::standard(),
            ProfileName::Projector => Self::projector(),
        }
    }
}

impl Default for ColorProfile {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fraction of the way to saturation, clamped to [0, 1]. Non-positive saturations saturate
/// any non-zero value.
fn saturation_fraction(magnitude: f64, saturation: f64) -> f32 {
    if !magnitude.is_finite() {
        return 1.0;
    }
    if saturation <= 0.0 {
        return if magnitude > 0.0 { 1.0 } else { 0.0 };
    }
    (magnitude / saturation).clamp(0.0, 1.0) as f32
}

fn blend(from: Srgb<u8>, to: Srgb<u8>, t: f32) -> Srgba<u8> {
    let from: Srgb<f32> = from.into_format();
    let to: Srgb<f32> = to.into_format();
    from.mix(to, t).into_format::<u8>().with_alpha(255u8)
}

/// Color of a potential grid cell: zero color at 0 V, ramping linearly towards the
/// positive or negative saturation color, reaching it at `|value| >= saturation`.
pub fn potential_color(value: f64, saturation: f64, profile: &ColorProfile) -> Srgba<u8> {
    let t = saturation_fraction(value.abs(), saturation);
    let target = if value < 0.0 {
        profile.potential_negative
    } else {
        profile.potential_positive
    };
    blend(profile.potential_zero, target, t)
}

/// Color of a field arrow of the given magnitude.
pub fn field_color(magnitude: f64, saturation: f64, profile: &ColorProfile) -> Srgba<u8> {
    let t = saturation_fraction(magnitude.abs(), saturation);
    blend(profile.field_zero, profile.field_saturation, t)
}

/// Opacity for arrows when only the field direction is shown: fully opaque above
/// saturation, fading out linearly towards zero field.
pub fn field_alpha(magnitude: f64, saturation: f64) -> u8 {
    (saturation_fraction(magnitude.abs(), saturation) * 255.0).round() as u8
}

/// Holds the active color profile and notifies subscribers when it changes.
pub struct ProfileStore {
    current: ColorProfile,
    subscribers: Vec<Sender<ColorProfile>>,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new(ColorProfile::standard())
    }
}

impl ProfileStore {
    pub fn new(profile: ColorProfile) -> Self {
        Self {
            current: profile,
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> &ColorProfile {
        &self.current
    }

    pub fn subscribe(&mut self) -> Receiver<ColorProfile> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Replace the profile. Subscribers are only notified when something actually changed.
    pub fn set(&mut self, profile: ColorProfile) {
        if profile == self.current {
            return;
        }
        self.current = profile;
        let current = &self.current;
        self.subscribers.retain(|tx| tx.send(current.clone()).is_ok());
    }

    pub fn select(&mut self, name: ProfileName) {
        self.set(ColorProfile::from_name(name));
    }
}
