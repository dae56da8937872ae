use plotters::style::RGBColor;

pub const FOCUS: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
pub const COMPETITOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
pub const MUTED: RGBColor = RGBColor(0x95, 0xa5, 0xa6);
pub const GAP: RGBColor = RGBColor(0xf3, 0x9c, 0x12);
pub const POSITIVE: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
pub const DARK: RGBColor = RGBColor(0x2c, 0x3e, 0x50);

/// Distinct colours for banks, zones and clusters; cycles past the end.
const CATEGORICAL: [RGBColor; 12] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
    RGBColor(0xae, 0xc7, 0xe8),
    RGBColor(0xff, 0xbb, 0x78),
    RGBColor(0x98, 0xdf, 0x8a),
];

pub fn categorical(index: usize) -> RGBColor {
    CATEGORICAL[index % CATEGORICAL.len()]
}

/// Yellow to red, for "more is hotter" scales.
pub const HEAT: [RGBColor; 4] = [
    RGBColor(0xff, 0xff, 0xcc),
    RGBColor(0xfe, 0xb2, 0x4c),
    RGBColor(0xf0, 0x3b, 0x20),
    RGBColor(0xbd, 0x00, 0x26),
];

pub const BLUES: [RGBColor; 3] = [
    RGBColor(0xde, 0xeb, 0xf7),
    RGBColor(0x6b, 0xae, 0xd6),
    RGBColor(0x08, 0x45, 0x94),
];

/// Red (close) through green (far), used for distance bins.
pub const NEAR_TO_FAR: [RGBColor; 3] = [
    RGBColor(0xe7, 0x4c, 0x3c),
    RGBColor(0xf1, 0xc4, 0x0f),
    RGBColor(0x27, 0xae, 0x60),
];

/// Linear interpolation across `stops` for `t` in `[0, 1]`.
pub fn gradient(stops: &[RGBColor], t: f64) -> RGBColor {
    match stops {
        [] => MUTED,
        [only] => *only,
        _ => {
            let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
            let scaled = t * (stops.len() - 1) as f64;
            let index = (scaled.floor() as usize).min(stops.len() - 2);
            let local = scaled - index as f64;
            let (from, to) = (stops[index], stops[index + 1]);
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * local).round() as u8;
            RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
        }
    }
}

/// `value / max` guarded against an empty or zero scale.
pub fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_hits_both_ends_and_interpolates() {
        assert_eq!(gradient(&BLUES, 0.0), BLUES[0]);
        assert_eq!(gradient(&BLUES, 1.0), BLUES[2]);
        assert_eq!(gradient(&BLUES, 7.0), BLUES[2]);
        let middle = gradient(&[RGBColor(0, 0, 0), RGBColor(200, 100, 50)], 0.5);
        assert_eq!(middle, RGBColor(100, 50, 25));
    }

    #[test]
    fn categorical_colours_cycle() {
        assert_eq!(categorical(0), categorical(12));
    }
}
