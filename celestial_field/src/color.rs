//! Color helpers.
//!
//! Pools store colors as flat linear `[r, g, b]` triples in `[0, 1]`;
//! backends pack them however they like.

/// `0xRRGGBB` → `[r, g, b]`.
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    let r = (hex >> 16) & 0xFF;
    let g = (hex >>  8) & 0xFF;
    let b =  hex        & 0xFF;
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// HSL with every component in `[0, 1]` → `[r, g, b]`.
pub fn hsl_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

pub fn lerp_rgb(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

pub fn scale_rgb(c: [f32; 3], k: f32) -> [f32; 3] {
    [c[0] * k, c[1] * k, c[2] * k]
}

/// `[r, g, b]` → packed opaque ARGB (`0xFFRRGGBB`).
pub fn pack_argb(c: [f32; 3]) -> u32 {
    let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    0xFF00_0000 | (to8(c[0]) << 16) | (to8(c[1]) << 8) | to8(c[2])
}

// ── Palette ──────────────────────────────────────────────────────────────────

pub const WHITE:      u32 = 0xFFFFFF;
pub const RED:        u32 = 0xFF3366;
pub const GOLD:       u32 = 0xFFD700;
pub const CORE_OUTER: u32 = 0xFF1A75;

/// Star palette of the main field, weighted toward white.
pub const STAR_PALETTE: [u32; 5] = [WHITE, WHITE, WHITE, GOLD, RED];

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-3)
    }

    #[test]
    fn hex_decodes_channels() {
        assert!(close(hex_rgb(GOLD), [1.0, 215.0 / 255.0, 0.0]));
        assert_eq!(hex_rgb(WHITE), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn hsl_primaries() {
        assert!(close(hsl_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_rgb(1.0 / 3.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_rgb(0.5, 1.0, 0.5), [0.0, 1.0, 1.0]));
        assert!(close(hsl_rgb(0.2, 0.0, 0.3), [0.3, 0.3, 0.3]));
    }

    #[test]
    fn pack_is_opaque() {
        assert_eq!(pack_argb([1.0, 0.0, 0.0]), 0xFFFF0000);
        assert_eq!(pack_argb([2.0, -1.0, 1.0]) >> 24, 0xFF);
    }

    #[test]
    fn lerp_endpoints() {
        let a = hex_rgb(WHITE);
        let b = hex_rgb(CORE_OUTER);
        assert_eq!(lerp_rgb(a, b, 0.0), a);
        assert!(close(lerp_rgb(a, b, 1.0), b));
    }
}
