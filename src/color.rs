/// Largest Euclidean distance between two 8-bit RGB colors, `√(255² · 3)`.
pub const MAX_TOLERANCE: f32 = 441.672_96;

/// Largest squared distance between two 8-bit RGB colors, `255² · 3`.
pub const MAX_DISTANCE_SQ: u32 = 195_075;

/// An opaque 8-bit sRGB color.
///
/// Alpha only matters while scanning pixels (transparent pixels are skipped),
/// so it is never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space. Exact, in `0..=MAX_DISTANCE_SQ`.
    pub fn distance_sq(self, other: Self) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Euclidean distance in RGB space.
    pub fn distance(self, other: Self) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    pub fn to_hsv(self) -> Hsv {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let delta = (max - min) as f32;

        let r = self.r as f32;
        let g = self.g as f32;
        let b = self.b as f32;

        let h = if max == min {
            0.0
        } else if max == self.r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == self.g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let s = if max == 0 { 0.0 } else { delta / max as f32 };

        Hsv {
            h,
            s,
            v: max as f32 / 255.0,
        }
    }

    /// Hue angle in degrees, `[0, 360)`. Grays report 0.
    pub fn hue(self) -> f32 {
        self.to_hsv().h
    }

    /// Uppercase `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl From<rgb::RGB8> for Color {
    fn from(p: rgb::RGB8) -> Self {
        Self::new(p.r, p.g, p.b)
    }
}

/// Drops alpha. Callers that care about transparency must filter first.
impl From<rgb::RGBA8> for Color {
    fn from(p: rgb::RGBA8) -> Self {
        Self::new(p.r, p.g, p.b)
    }
}

impl From<Color> for rgb::RGB8 {
    fn from(c: Color) -> Self {
        rgb::RGB8 {
            r: c.r,
            g: c.g,
            b: c.b,
        }
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}
