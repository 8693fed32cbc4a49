//! Software rasteriser implementing [`RenderBackend`].
//!
//! Every pool is drawn as splatted points (or line segments for the speed
//! lines) into a `0xAARRGGBB` framebuffer after a pinhole perspective
//! projection.  Bloom-style pools add their light onto the buffer; the rest
//! blend over it.  Linear depth fog fades points toward the background.

use std::collections::HashMap;

use celestial_field::color::pack_argb;
use celestial_field::{CameraRig, FogParams, PoolKind, PoolState, RenderBackend};
use glam::{EulerRot, Mat3, Vec3};

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

pub const BG_COLOR:     u32 = 0xFF000000;
const NEAR_PLANE:       f32 = 0.1;
/// World-space diameter of a unit-scale particle.
const POINT_SIZE:       f32 = 0.15;
/// Splat radius cap, pixels.
const MAX_RADIUS:       i32 = 6;
/// Additive contribution of one splat at full opacity.
const GLOW:             f32 = 0.6;

// ════════════════════════════════════════════════════════════════════════════
// Pool storage
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct PoolBuffers {
    colors:    Vec<f32>,
    positions: Vec<f32>,
    scales:    Vec<f32>,
    state:     PoolState,
}

/// A projected point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub x:      f32,
    pub y:      f32,
    /// Distance along the view axis.
    pub depth:  f32,
    /// Pixels per world unit at this depth.
    pub pixels: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Camera projection
// ════════════════════════════════════════════════════════════════════════════

/// Pinhole camera built from a [`CameraRig`].
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    eye:    Vec3,
    view:   Mat3,
    focal:  f32,
    width:  f32,
    height: f32,
}

impl Projection {
    pub fn new(rig: &CameraRig, width: usize, height: usize) -> Self {
        let fov = rig.fov_degrees.clamp(1.0, 170.0).to_radians();
        let orient = Mat3::from_euler(EulerRot::YXZ, rig.yaw, rig.pitch, rig.roll);
        Projection {
            eye:    Vec3::new(rig.offset_x, rig.offset_y, rig.depth),
            view:   orient.transpose(),
            focal:  (height as f32 / 2.0) / (fov / 2.0).tan(),
            width:  width as f32,
            height: height as f32,
        }
    }

    /// Screen position of world point `p`, or `None` behind the near plane.
    pub fn project(&self, p: Vec3) -> Option<Projected> {
        let v = self.view * (p - self.eye);
        let depth = -v.z;
        if depth <= NEAR_PLANE {
            return None;
        }
        let pixels = self.focal / depth;
        Some(Projected {
            x: self.width / 2.0 + v.x * pixels,
            y: self.height / 2.0 - v.y * pixels,
            depth,
            pixels,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SoftwareRenderer
// ════════════════════════════════════════════════════════════════════════════

pub struct SoftwareRenderer {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
    order:  Vec<PoolKind>,
    pools:  HashMap<PoolKind, PoolBuffers>,
    camera: Option<CameraRig>,
    fog:    Option<FogParams>,
}

impl SoftwareRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        SoftwareRenderer {
            width,
            height,
            buf:    vec![BG_COLOR; width * height],
            order:  Vec::new(),
            pools:  HashMap::new(),
            camera: None,
            fog:    None,
        }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn buffer(&self) -> &[u32] { &self.buf }

    /// Number of pools registered so far.
    pub fn pool_count(&self) -> usize { self.order.len() }

    /// Rasterise every visible pool in registration order over the fog
    /// color.
    pub fn render(&mut self) {
        let bg = self.fog.map_or(BG_COLOR, |f| pack_argb(f.color));
        self.buf.fill(bg);
        let rig = match self.camera {
            Some(rig) => rig,
            None      => return,
        };
        let projection = Projection::new(&rig, self.width, self.height);
        let fog = self.fog;

        let order = self.order.clone();
        for kind in order {
            let pool = match self.pools.remove(&kind) {
                Some(p) => p,
                None    => continue,
            };
            if pool.state.visible && pool.state.opacity > 0.0 {
                self.draw_pool(kind, &pool, &projection, fog.as_ref());
            }
            self.pools.insert(kind, pool);
        }
    }

    fn draw_pool(
        &mut self,
        kind:       PoolKind,
        pool:       &PoolBuffers,
        projection: &Projection,
        fog:        Option<&FogParams>,
    ) {
        let s = &pool.state;
        let group = Mat3::from_euler(EulerRot::XYZ, s.rotation.x, s.rotation.y, s.rotation.z)
            * Mat3::from_diagonal(Vec3::splat(s.scale));
        let count = pool.scales.len().min(pool.positions.len() / 3);
        let additive = kind.is_additive();

        let color_of = |i: usize| -> [f32; 3] {
            let o = i * 3;
            match pool.colors.get(o..o + 3) {
                Some(c) => [c[0], c[1], c[2]],
                None    => [1.0, 1.0, 1.0],
            }
        };
        let world_of = |i: usize| -> Vec3 {
            let o = i * 3;
            group * Vec3::new(pool.positions[o], pool.positions[o + 1], pool.positions[o + 2])
        };
        let fade = |depth: f32| fog.map_or(1.0, |f| f.visibility(depth));

        if kind.is_lines() {
            for i in (0..count.saturating_sub(1)).step_by(2) {
                let (a, b) = match (projection.project(world_of(i)), projection.project(world_of(i + 1))) {
                    (Some(a), Some(b)) => (a, b),
                    _ => continue,
                };
                let alpha = s.opacity * fade(a.depth.min(b.depth));
                self.draw_line(a, b, color_of(i), alpha);
            }
            return;
        }

        for i in 0..count {
            let p = match projection.project(world_of(i)) {
                Some(p) => p,
                None    => continue,
            };
            let alpha = s.opacity * fade(p.depth);
            if alpha <= 0.0 {
                continue;
            }
            let radius = (pool.scales[i] * s.scale * POINT_SIZE * p.pixels * 0.5) as i32;
            let radius = radius.clamp(0, MAX_RADIUS);
            let rgb = color_of(i);
            if additive {
                self.splat_add(p.x as i32, p.y as i32, radius, rgb, alpha * GLOW);
            } else {
                self.splat_over(p.x as i32, p.y as i32, radius, rgb, alpha);
            }
        }
    }

    // ── Splats and lines ──────────────────────────────────────────────────

    fn splat_add(&mut self, cx: i32, cy: i32, r: i32, rgb: [f32; 3], alpha: f32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r { continue; }
                self.add_pixel(cx + dx, cy + dy, rgb, alpha);
            }
        }
    }

    fn splat_over(&mut self, cx: i32, cy: i32, r: i32, rgb: [f32; 3], alpha: f32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r { continue; }
                if let Some(idx) = self.index(cx + dx, cy + dy) {
                    self.buf[idx] = over(self.buf[idx], rgb, alpha);
                }
            }
        }
    }

    fn draw_line(&mut self, a: Projected, b: Projected, rgb: [f32; 3], alpha: f32) {
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().min(2048.0) as i32;
        if steps == 0 {
            self.add_pixel(a.x as i32, a.y as i32, rgb, alpha);
            return;
        }
        for k in 0..=steps {
            let t = k as f32 / steps as f32;
            let x = a.x + (b.x - a.x) * t;
            let y = a.y + (b.y - a.y) * t;
            self.add_pixel(x as i32, y as i32, rgb, alpha);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    fn add_pixel(&mut self, x: i32, y: i32, rgb: [f32; 3], alpha: f32) {
        if let Some(idx) = self.index(x, y) {
            self.buf[idx] = add(self.buf[idx], rgb, alpha);
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// 3×5 bitmap text at `scale`, clipped at the right edge.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let scale = scale.max(1);
        let advance = (GLYPH_W + 1) * scale;
        let mut cx = x;
        for ch in text.chars() {
            if cx + advance > self.width { break; }
            let bits = glyph_bits(ch);
            for row in 0..GLYPH_H {
                for col in 0..GLYPH_W {
                    if glyph_lit(bits, row, col) {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += advance;
        }
    }
}

impl RenderBackend for SoftwareRenderer {
    fn register_pool(&mut self, kind: PoolKind, colors: &[f32]) {
        if !self.order.contains(&kind) {
            self.order.push(kind);
        }
        self.pools.entry(kind).or_default().colors = colors.to_vec();
    }

    fn upload_instances(&mut self, kind: PoolKind, positions: &[f32], scales: &[f32]) {
        let pool = self.pools.entry(kind).or_default();
        pool.positions.clear();
        pool.positions.extend_from_slice(positions);
        pool.scales.clear();
        pool.scales.extend_from_slice(scales);
    }

    fn set_pool_state(&mut self, kind: PoolKind, state: &PoolState) {
        self.pools.entry(kind).or_default().state = *state;
    }

    fn set_camera(&mut self, rig: &CameraRig) {
        self.camera = Some(*rig);
    }

    fn set_fog(&mut self, fog: &FogParams) {
        self.fog = Some(*fog);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Color packing
// ────────────────────────────────────────────────────────────────────────────

fn channel(v: f32) -> u32 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u32
}

/// Saturating additive blend of `rgb × alpha` onto `dst`.
fn add(dst: u32, rgb: [f32; 3], alpha: f32) -> u32 {
    let sum = |shift: u32, c: f32| (((dst >> shift) & 0xFF) + channel(c * alpha)).min(0xFF);
    0xFF000000 | (sum(16, rgb[0]) << 16) | (sum(8, rgb[1]) << 8) | sum(0, rgb[2])
}

/// `rgb` laid over `dst` with coverage `alpha`.
fn over(dst: u32, rgb: [f32; 3], alpha: f32) -> u32 {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |shift: u32, c: f32| {
        let d = ((dst >> shift) & 0xFF) as f32 / 255.0;
        channel(d + (c - d) * a)
    };
    0xFF000000 | (mix(16, rgb[0]) << 16) | (mix(8, rgb[1]) << 8) | mix(0, rgb[2])
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;
const MISSING_GLYPH: u16 = 0b000_000_010_000_000;

fn glyph_lit(bits: u16, row: usize, col: usize) -> bool {
    let shift = (GLYPH_H - 1 - row) * GLYPH_W + (GLYPH_W - 1 - col);
    (bits >> shift) & 1 == 1
}

/// Glyph rows packed top to bottom, three bits each, high bit first.
/// Letters are case-folded; anything unknown draws as a centre dot.
fn glyph_bits(c: char) -> u16 {
    match c.to_ascii_lowercase() {
        '0' => 0b111_101_101_101_111,  '1' => 0b010_110_010_010_111,  '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,  '4' => 0b101_101_111_001_001,  '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,  '7' => 0b111_001_001_001_001,  '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,  'a' => 0b111_101_111_101_101,  'b' => 0b110_101_110_101_110,
        'c' => 0b111_100_100_100_111,  'd' => 0b110_101_101_101_110,  'e' => 0b111_100_111_100_111,
        'f' => 0b111_100_111_100_100,  'g' => 0b111_100_101_101_111,  'h' => 0b101_101_111_101_101,
        'i' => 0b111_010_010_010_111,  'k' => 0b101_101_110_101_101,  'l' => 0b100_100_100_100_111,
        'm' => 0b101_111_101_101_101,  'n' => 0b111_101_101_101_101,  'o' => 0b111_101_101_101_111,
        'p' => 0b111_101_111_100_100,  'q' => 0b111_101_101_111_001,  'r' => 0b110_101_110_101_101,
        's' => 0b111_100_111_001_111,  't' => 0b111_010_010_010_010,  'u' => 0b101_101_101_101_111,
        'v' => 0b101_101_101_010_010,  'w' => 0b101_101_101_111_101,  'x' => 0b101_101_010_101_101,
        'y' => 0b101_101_111_010_010,  'z' => 0b111_001_010_100_111,  '.' => 0b000_000_000_000_010,
        '/' => 0b001_001_010_100_100,  '-' => 0b000_000_111_000_000,  '=' => 0b000_111_000_111_000,
        '+' => 0b000_010_111_010_000,  '%' => 0b101_001_010_100_101,  '[' => 0b110_100_100_100_110,
        ']' => 0b011_001_001_001_011,
        ' ' => 0,
        _   => MISSING_GLYPH,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn rig(depth: f32) -> CameraRig {
        CameraRig {
            depth,
            fov_degrees: 60.0,
            offset_x:    0.0,
            offset_y:    0.0,
            roll:        0.0,
            pitch:       0.0,
            yaw:         0.0,
            closeness:   0.0,
        }
    }

    fn lit(r: &SoftwareRenderer) -> usize {
        r.buffer().iter().filter(|&&px| px != BG_COLOR).count()
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let p = Projection::new(&rig(20.0), 200, 100).project(Vec3::ZERO).unwrap();
        assert!((p.x - 100.0).abs() < 1e-3);
        assert!((p.y - 50.0).abs() < 1e-3);
        assert!((p.depth - 20.0).abs() < 1e-4);
    }

    #[test]
    fn up_is_up_and_behind_is_culled() {
        let proj = Projection::new(&rig(20.0), 200, 100);
        let up = proj.project(Vec3::new(0.0, 2.0, 0.0)).unwrap();
        assert!(up.y < 50.0);
        assert!(proj.project(Vec3::new(0.0, 0.0, 25.0)).is_none());

        // closer points spread further
        let near = Projection::new(&rig(5.0), 200, 100);
        assert!(near.project(Vec3::X).unwrap().x > proj.project(Vec3::X).unwrap().x);
    }

    #[test]
    fn nothing_drawn_without_a_camera() {
        let mut r = SoftwareRenderer::new(64, 64);
        r.register_pool(PoolKind::Field, &[1.0, 1.0, 1.0]);
        r.upload_instances(PoolKind::Field, &[0.0, 0.0, 0.0], &[1.0]);
        r.set_pool_state(PoolKind::Field, &PoolState::default());
        r.render();
        assert_eq!(lit(&r), 0);
    }

    #[test]
    fn visible_pool_lights_pixels_hidden_pool_does_not() {
        let mut r = SoftwareRenderer::new(64, 64);
        r.register_pool(PoolKind::Field, &[1.0, 0.5, 0.0]);
        r.upload_instances(PoolKind::Field, &[0.0, 0.0, 0.0], &[1.0]);
        r.set_pool_state(PoolKind::Field, &PoolState::default());
        r.set_camera(&rig(20.0));
        r.render();
        assert!(lit(&r) > 0);
        assert_eq!(r.pool_count(), 1);

        r.set_pool_state(PoolKind::Field, &PoolState::hidden());
        r.render();
        assert_eq!(lit(&r), 0);
    }

    #[test]
    fn fog_swallows_distant_points() {
        let mut r = SoftwareRenderer::new(64, 64);
        r.register_pool(PoolKind::Stars, &[1.0, 1.0, 1.0]);
        r.upload_instances(PoolKind::Stars, &[0.0, 0.0, 0.0], &[1.0]);
        r.set_pool_state(PoolKind::Stars, &PoolState::default());
        r.set_camera(&rig(20.0));
        r.set_fog(&FogParams { near: 1.0, far: 10.0, color: [0.0; 3] });
        r.render();
        assert_eq!(lit(&r), 0);
    }

    #[test]
    fn speed_lines_draw_segments() {
        let mut r = SoftwareRenderer::new(64, 64);
        r.register_pool(PoolKind::SpeedLines, &[1.0; 6]);
        r.upload_instances(PoolKind::SpeedLines, &[-2.0, 0.0, 0.0, 2.0, 0.0, 0.0], &[1.0, 1.0]);
        r.set_pool_state(PoolKind::SpeedLines, &PoolState::default());
        r.set_camera(&rig(20.0));
        r.render();
        // a horizontal run of pixels, not a single splat
        assert!(lit(&r) >= 10);
    }

    #[test]
    fn additive_saturates_over_interpolates() {
        let px = add(0xFF_F0_00_00, [1.0, 0.0, 0.0], 1.0);
        assert_eq!(px, 0xFF_FF_00_00);
        assert_eq!(over(0xFF000000, [1.0; 3], 0.0), 0xFF000000);
        assert_eq!(over(0xFF000000, [1.0; 3], 1.0), 0xFFFFFFFF);
        assert_eq!(over(0xFF000000, [1.0, 0.0, 0.0], 0.5), 0xFF80_0000);
            }

    #[test]
    fn labels_stay_inside_the_buffer() {
        let mut r = SoftwareRenderer::new(40, 10);
        r.draw_label("quality 100% [ok]", 0, 0, 2, 0xFFFFFFFF);
        assert!(lit(&r) > 0);
    }

    #[test]
    fn glyphs_fold_case_and_mark_unknowns() {
        assert_eq!(glyph_bits('Q'), glyph_bits('q'));
        assert_eq!(glyph_bits(' '), 0);
        assert_eq!(glyph_bits('~'), MISSING_GLYPH);
        // '1' has its stem in the middle column on every row
        let one = glyph_bits('1');
        assert!((0..GLYPH_H).all(|row| glyph_lit(one, row, 1)));
        assert!(!glyph_lit(one, 0, 0));
    }
}
