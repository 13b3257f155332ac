use vello::peniko::Color;

/// Breakpoints (percent change) of the diverging heatmap ramp.
pub const CHANGE_BREAKPOINTS: [f64; 7] = [-5.0, -2.0, -0.5, 0.0, 0.5, 2.0, 5.0];

/// Ramp colors for [`CHANGE_BREAKPOINTS`]: deep red → neutral dark → deep green.
pub const CHANGE_COLORS: [AppColor; 7] = [
    AppColor::from_rgb8(0xb7, 0x1c, 0x1c), // deep red
    AppColor::from_rgb8(0xe5, 0x39, 0x35), // bright red
    AppColor::from_rgb8(0x5d, 0x40, 0x37), // muted red-brown
    AppColor::from_rgb8(0x37, 0x47, 0x4f), // neutral dark
    AppColor::from_rgb8(0x2e, 0x7d, 0x32), // muted green
    AppColor::from_rgb8(0x43, 0xa0, 0x47), // bright green
    AppColor::from_rgb8(0x1b, 0x5e, 0x20), // deep green
];

/// Background behind the treemap.
pub const BACKGROUND: AppColor = AppColor::from_rgb8(0x1a, 0x1a, 0x2e);
/// Border around group frames.
pub const GROUP_BORDER: AppColor = AppColor::from_rgb8(0x0f, 0x34, 0x60);
/// Group label text.
pub const GROUP_LABEL: AppColor = AppColor::from_rgb8(0x88, 0x99, 0xaa);

/// How much of a de-emphasized tile's color survives.
const DIM_KEEP: f32 = 0.2;

/// Our custom color representation for easy manipulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl AppColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Convert to vello's peniko Color.
    pub fn to_peniko(self) -> Color {
        Color::new([self.r, self.g, self.b, self.a])
    }

    /// Linear blend towards `other` in sRGB space (`t` clamped to 0..=1).
    pub fn lerp(self, other: AppColor, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Create a lighter version (hover highlight).
    pub fn lighten(self, amount: f32) -> Self {
        Self {
            r: (self.r + amount).min(1.0),
            g: (self.g + amount).min(1.0),
            b: (self.b + amount).min(1.0),
            a: self.a,
        }
    }

    /// Strong de-emphasis for tiles that do not match the search.
    /// Keeps the hue readable but pushes it close to the background.
    pub fn dimmed(self) -> Self {
        BACKGROUND.lerp(self, DIM_KEEP)
    }
}

/// Map a signed percentage change onto the heatmap ramp.
/// Values outside the breakpoint domain clamp to the end colors; NaN is neutral.
pub fn color_for(change_percent: f64) -> AppColor {
    if change_percent.is_nan() {
        return CHANGE_COLORS[3];
    }

    let last = CHANGE_BREAKPOINTS.len() - 1;
    if change_percent <= CHANGE_BREAKPOINTS[0] {
        return CHANGE_COLORS[0];
    }
    if change_percent >= CHANGE_BREAKPOINTS[last] {
        return CHANGE_COLORS[last];
    }

    for i in 0..last {
        let (lo, hi) = (CHANGE_BREAKPOINTS[i], CHANGE_BREAKPOINTS[i + 1]);
        if change_percent == lo {
            return CHANGE_COLORS[i];
        }
        if change_percent < hi {
            let t = (change_percent - lo) / (hi - lo);
            return CHANGE_COLORS[i].lerp(CHANGE_COLORS[i + 1], t as f32);
        }
    }
    CHANGE_COLORS[last]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_above_domain() {
        assert_eq!(color_for(5.0), color_for(100.0));
        assert_eq!(color_for(5.0), CHANGE_COLORS[6]);
    }

    #[test]
    fn clamps_below_domain() {
        assert_eq!(color_for(-5.0), color_for(-42.0));
        assert_eq!(color_for(f64::NEG_INFINITY), CHANGE_COLORS[0]);
    }

    #[test]
    fn zero_is_exactly_neutral() {
        assert_eq!(color_for(0.0), CHANGE_COLORS[3]);
        assert_eq!(color_for(f64::NAN), CHANGE_COLORS[3]);
    }

    #[test]
    fn every_breakpoint_hits_its_color() {
        for (bp, color) in CHANGE_BREAKPOINTS.iter().zip(CHANGE_COLORS) {
            assert_eq!(color_for(*bp), color);
        }
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let mid = color_for(1.25);
        let expected = CHANGE_COLORS[4].lerp(CHANGE_COLORS[5], 0.5);
        assert!((mid.r - expected.r).abs() < 1e-6);
        assert!((mid.g - expected.g).abs() < 1e-6);
        assert!((mid.b - expected.b).abs() < 1e-6);
    }

    #[test]
    fn dimmed_moves_towards_background() {
        let base = color_for(5.0);
        let dim = base.dimmed();
        let dist = |c: AppColor| (c.r - BACKGROUND.r).abs() + (c.g - BACKGROUND.g).abs() + (c.b - BACKGROUND.b).abs();
        assert!(dist(dim) < dist(base));
    }
}
