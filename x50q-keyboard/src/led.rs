//! Per-key lighting types: colors, effects and active durations

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Number of per-key slots in every lighting table.
///
/// Only 115 of them are wired to LEDs (107 keys, two side bars with two LEDs
/// each, four around the volume knob); the rest are ignored by the firmware.
pub const KEY_COUNT: usize = 144;

/// Size of a full color upload: red, green and blue planes
pub const COLOR_TABLE_SIZE: usize = 3 * KEY_COUNT;

/// RGB color value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Create a new RGB color
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create color from HSV values
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h % 360.0;
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match (h / 60.0) as i32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Self {
            r: ((r + m) * 255.0) as u8,
            g: ((g + m) * 255.0) as u8,
            b: ((b + m) * 255.0) as u8,
        }
    }

    /// Black (all LEDs off)
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    /// White (all LEDs full)
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };
    /// Red
    pub const RED: Self = Self { r: 255, g: 0, b: 0 };
    /// Green
    pub const GREEN: Self = Self { r: 0, g: 255, b: 0 };
    /// Blue
    pub const BLUE: Self = Self { r: 0, g: 0, b: 255 };
}

impl FromStr for RgbColor {
    type Err = String;

    /// Parse `RGB` or `RRGGBB` hex, with optional leading `#`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let err = || format!("invalid color \"{s}\": use RGB or RRGGBB hex");
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map_err(|_| err());
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            3 => Ok(Self::new(digit(0)? * 0x11, digit(1)? * 0x11, digit(2)? * 0x11)),
            6 => Ok(Self::new(pair(0)?, pair(2)?, pair(4)?)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Per-key lighting effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Effect {
    /// Static color from the color table
    #[default]
    SetColor = 0,
    Breadth = 1,
    Cycle = 2,
    // 3 is reserved
    Blink = 4,
    Ripple = 5,
    InwardsRipple = 6,
    Laser = 7,
}

impl Effect {
    /// All effects in wire order
    pub const ALL: [Effect; 7] = [
        Effect::SetColor,
        Effect::Breadth,
        Effect::Cycle,
        Effect::Blink,
        Effect::Ripple,
        Effect::InwardsRipple,
        Effect::Laser,
    ];

    /// Get effect from numeric value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::SetColor),
            1 => Some(Self::Breadth),
            2 => Some(Self::Cycle),
            4 => Some(Self::Blink),
            5 => Some(Self::Ripple),
            6 => Some(Self::InwardsRipple),
            7 => Some(Self::Laser),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get the display name for this effect
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetColor => "set-color",
            Self::Breadth => "breadth",
            Self::Cycle => "cycle",
            Self::Blink => "blink",
            Self::Ripple => "ripple",
            Self::InwardsRipple => "inwards-ripple",
            Self::Laser => "laser",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = String;

    /// Parse an effect name (`cycle`, `inwards-ripple`, ...) or its number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = s.parse::<u8>() {
            return Self::from_u8(value).ok_or_else(|| format!("unknown effect number {value}"));
        }
        let normalized = s.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|e| e.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|e| e.name()).collect();
                format!("unknown effect \"{s}\". Valid: {}", names.join(", "))
            })
    }
}

/// Duration in whole seconds, stored in a single byte (0-255 s)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSeconds(pub u8);

impl ByteSeconds {
    pub const fn from_secs(secs: u8) -> Self {
        Self(secs)
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl From<u8> for ByteSeconds {
    fn from(secs: u8) -> Self {
        Self(secs)
    }
}

impl TryFrom<Duration> for ByteSeconds {
    type Error = String;

    /// Whole seconds only; sub-second remainders are truncated
    fn try_from(d: Duration) -> Result<Self, Self::Error> {
        u8::try_from(d.as_secs())
            .map(Self)
            .map_err(|_| format!("duration {}s exceeds 255s", d.as_secs()))
    }
}

/// Per-key colors as three separate planes (red, green, blue)
///
/// The keyboard expects all 144 red values first, then all green, then all
/// blue. Key indices follow the firmware order, not the physical layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    planes: [[u8; KEY_COUNT]; 3],
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            planes: [[0; KEY_COUNT]; 3],
        }
    }
}

impl ColorTable {
    /// All keys black
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys set to `color`
    pub fn filled(color: RgbColor) -> Self {
        let mut table = Self::new();
        table.fill(color);
        table
    }

    pub fn fill(&mut self, color: RgbColor) {
        self.planes[0].fill(color.r);
        self.planes[1].fill(color.g);
        self.planes[2].fill(color.b);
    }

    /// Set one key; out-of-range indices are ignored
    pub fn set(&mut self, index: usize, color: RgbColor) {
        if index < KEY_COUNT {
            self.planes[0][index] = color.r;
            self.planes[1][index] = color.g;
            self.planes[2][index] = color.b;
        }
    }

    pub fn get(&self, index: usize) -> Option<RgbColor> {
        (index < KEY_COUNT).then(|| {
            RgbColor::new(
                self.planes[0][index],
                self.planes[1][index],
                self.planes[2][index],
            )
        })
    }

    /// Red, green and blue planes in wire order
    pub fn planes(&self) -> &[[u8; KEY_COUNT]; 3] {
        &self.planes
    }
}
