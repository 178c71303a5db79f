//! Linear RGBA colors, the small set of named colors visuals accept, and the
//! colormaps scalar images are displayed with.

use std::str::FromStr;

use crate::error::SceneError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Componentwise interpolation, `t = 0` gives `self`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Color::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    fn named(name: &str) -> Option<Color> {
        let c = match name {
            "black" | "k" => Color::BLACK,
            "white" | "w" => Color::WHITE,
            "red" | "r" => Color::RED,
            "green" | "g" => Color::GREEN,
            "blue" | "b" => Color::BLUE,
            "yellow" | "y" => Color::rgb(1.0, 1.0, 0.0),
            "cyan" | "c" => Color::rgb(0.0, 1.0, 1.0),
            "magenta" | "m" => Color::rgb(1.0, 0.0, 1.0),
            "gray" | "grey" => Color::rgb(0.5, 0.5, 0.5),
            "transparent" => Color::TRANSPARENT,
            _ => return None,
        };
        Some(c)
    }

    fn hex(digits: &str) -> Option<Color> {
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|d| u8::from_str_radix(d, 16).ok())
                .map(|v| v as f32 / 255.0)
        };
        match digits.len() {
            6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl FromStr for Color {
    type Err = SceneError;

    /// Accepts the named colors above and `#rrggbb` / `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix('#') {
            Some(digits) => Color::hex(digits),
            None => Color::named(&s.to_ascii_lowercase()),
        };
        parsed.ok_or_else(|| SceneError::invalid("color", format!("unknown color {:?}", s)))
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Color::rgba(c[0], c[1], c[2], c[3])
    }
}

impl From<[f32; 3]> for Color {
    fn from(c: [f32; 3]) -> Self {
        Color::rgb(c[0], c[1], c[2])
    }
}

impl From<(f32, f32, f32, f32)> for Color {
    fn from((r, g, b, a): (f32, f32, f32, f32)) -> Self {
        Color::rgba(r, g, b, a)
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

/// Maps normalized scalars in `0..=1` to colors.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Colormap {
    /// Black to white.
    #[default]
    Grays,
    /// Evenly spaced stops, interpolated linearly. At least one is required.
    Linear(Vec<Color>),
}

impl Colormap {
    pub fn validate(&self) -> Result<(), SceneError> {
        match self {
            Colormap::Linear(stops) if stops.is_empty() => Err(SceneError::invalid(
                "cmap",
                "a linear colormap needs at least one stop",
            )),
            _ => Ok(()),
        }
    }

    /// `t` is clamped to `0..=1`. NaN maps to transparent.
    pub fn map(&self, t: f32) -> Color {
        if t.is_nan() {
            return Color::TRANSPARENT;
        }
        let t = t.clamp(0.0, 1.0);
        match self {
            Colormap::Grays => Color::rgb(t, t, t),
            Colormap::Linear(stops) => match stops.len() {
                0 => Color::TRANSPARENT,
                1 => stops[0],
                n => {
                    let x = t * (n - 1) as f32;
                    let i = (x.floor() as usize).min(n - 2);
                    stops[i].lerp(stops[i + 1], x - i as f32)
                }
            },
        }
    }
}

impl FromStr for Colormap {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmap = match s.trim().to_ascii_lowercase().as_str() {
            "grays" | "greys" | "gray" | "grey" => Colormap::Grays,
            "hot" => Colormap::Linear(vec![
                Color::BLACK,
                Color::RED,
                Color::rgb(1.0, 1.0, 0.0),
                Color::WHITE,
            ]),
            "cool" => Colormap::Linear(vec![Color::rgb(0.0, 1.0, 1.0), Color::rgb(1.0, 0.0, 1.0)]),
            other => {
                return Err(SceneError::invalid(
                    "cmap",
                    format!("unknown colormap {:?}", other),
                ));
            }
        };
        Ok(cmap)
    }
}
