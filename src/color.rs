use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::ColumnKind;

// ---------------------------------------------------------------------------
// Fixed chart colours
// ---------------------------------------------------------------------------

pub const SKY_BLUE: Color32 = Color32::from_rgb(135, 206, 235);
pub const LINE_BLUE: Color32 = Color32::from_rgb(31, 119, 180);
pub const KDE_ORANGE: Color32 = Color32::from_rgb(255, 127, 14);
pub const MISSING_GRAY: Color32 = Color32::from_rgb(160, 160, 160);

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Distinct colours
// ---------------------------------------------------------------------------

/// `n` visually distinct colours on evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = i as f32 / n as f32 * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.65, 0.45).into_color();
            to_color32(rgb)
        })
        .collect()
}

/// Colour of the kind tag shown next to a column name.
pub fn kind_color(kind: ColumnKind) -> Color32 {
    let idx = match kind {
        ColumnKind::Numeric => 0,
        ColumnKind::Boolean => 1,
        ColumnKind::DateTime => 2,
        ColumnKind::Text => 3,
    };
    generate_palette(4)[idx]
}

// ---------------------------------------------------------------------------
// Diverging colour map for correlations
// ---------------------------------------------------------------------------

const COOL: (f32, f32, f32) = (0.230, 0.299, 0.754);
const NEUTRAL: (f32, f32, f32) = (0.865, 0.865, 0.865);
const WARM: (f32, f32, f32) = (0.706, 0.016, 0.150);

fn linear(c: (f32, f32, f32)) -> LinSrgb {
    Srgb::new(c.0, c.1, c.2).into_linear()
}

/// Blue → light grey → red over `[-1, 1]`, interpolated in linear RGB.
/// NaN maps to grey.
pub fn coolwarm(value: f64) -> Color32 {
    if value.is_nan() {
        return MISSING_GRAY;
    }
    let v = value.clamp(-1.0, 1.0) as f32;
    let mixed = if v < 0.0 {
        linear(NEUTRAL).mix(linear(COOL), -v)
    } else {
        linear(NEUTRAL).mix(linear(WARM), v)
    };
    to_color32(Srgb::from_linear(mixed))
}

/// `n` evenly spaced samples of the colour map from -1 to 1, for colour bars.
pub fn coolwarm_ramp(n: usize) -> Vec<(f64, Color32)> {
    if n < 2 {
        return vec![(0.0, coolwarm(0.0)); n];
    }
    (0..n)
        .map(|i| {
            let v = -1.0 + 2.0 * i as f64 / (n - 1) as f64;
            (v, coolwarm(v))
        })
        .collect()
}

/// Black or white, whichever reads better on `background`.
pub fn text_on(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_and_middle_of_coolwarm() {
        let cold = coolwarm(-1.0);
        let hot = coolwarm(1.0);
        let mid = coolwarm(0.0);
        assert!(cold.b() > cold.r());
        assert!(hot.r() > hot.b());
        assert_eq!(mid.r(), mid.g());
        assert_eq!(coolwarm(5.0), hot);
        assert_eq!(coolwarm(f64::NAN), MISSING_GRAY);
    }

    #[test]
    fn ramp_spans_the_range() {
        let ramp = coolwarm_ramp(5);
        assert_eq!(ramp.len(), 5);
        assert_eq!(ramp[0].0, -1.0);
        assert_eq!(ramp[4].0, 1.0);
        assert_eq!(ramp[2].1, coolwarm(0.0));
    }

    #[test]
    fn palette_colours_are_distinct() {
        assert!(generate_palette(0).is_empty());
        let colours = generate_palette(6);
        assert_eq!(colours.len(), 6);
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_ne!(kind_color(ColumnKind::Numeric), kind_color(ColumnKind::Text));
    }

    #[test]
    fn readable_text() {
        assert_eq!(text_on(Color32::WHITE), Color32::BLACK);
        assert_eq!(text_on(Color32::from_rgb(20, 20, 80)), Color32::WHITE);
    }
}
