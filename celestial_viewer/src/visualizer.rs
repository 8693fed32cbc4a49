//! minifb window around the [`SoftwareRenderer`].
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │                   scene (perspective points)                 │
//! │                                                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │ status bar                                                   │
//! │ key legend                                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keyboard and mouse are translated into [`SimInput`] events for the
//! simulated hand tracker, plus wheel and settings input for the app.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use crate::error::{Result, ViewerError};
use crate::raster::SoftwareRenderer;
use crate::tracking::{SimInput, SimPose};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 1280;
pub const WIN_H:       usize = 720;
const STATUS_H:        usize = 40;
const TEXT_BG:         u32   = 0xFF0B0B1A;
const TEXT_COLOR:      u32   = 0xFFEEEEEE;
const LEGEND_COLOR:    u32   = 0xFF888888;
/// Wheel units per minifb scroll step, matching browser wheel deltas.
const WHEEL_UNITS:     f32   = 100.0;

const LEGEND: &str =
    "F=fist  O=open  R=relaxed  P=pinch  H=heart  N=no hand  up/down=pinch  wheel=zoom  [ ]=quality  - +=sensitivity  Q=quit";

// ════════════════════════════════════════════════════════════════════════════
// WindowInput
// ════════════════════════════════════════════════════════════════════════════

/// Per-frame input the app consumes directly.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowInput {
    /// Wheel delta, positive = away from the scene.
    pub wheel:             f32,
    /// Particle quality step, in tens of percent.
    pub quality_step:      i32,
    /// Detection sensitivity step, in tens.
    pub sensitivity_step:  i32,
    pub quit:              bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:   Window,
    renderer: SoftwareRenderer,
    sim_tx:   Sender<SimInput>,
    pointer:  Option<(f32, f32)>,
}

impl Visualizer {
    pub fn new(width: usize, height: usize, sim_tx: Sender<SimInput>) -> Result<Self> {
        let mut window = Window::new(
            "Celestial: heart / galaxy",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| ViewerError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            renderer: SoftwareRenderer::new(width, height),
            sim_tx,
            pointer: None,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// The render backend the scene presents into.
    pub fn renderer_mut(&mut self) -> &mut SoftwareRenderer { &mut self.renderer }

    /// Poll keyboard and mouse, forwarding hand input to the simulator.
    pub fn poll_input(&mut self) -> WindowInput {
        let mut input = WindowInput::default();
        if !self.window.is_open() {
            input.quit = true;
            return input;
        }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        let mut events = Vec::new();
        if one_shot(Key::Q) || one_shot(Key::Escape) {
            events.push(SimInput::Quit);
            input.quit = true;
        }

        for &(key, pose) in [
            (Key::F, SimPose::Fist),
            (Key::O, SimPose::Open),
            (Key::R, SimPose::Relaxed),
            (Key::P, SimPose::Pinch),
            (Key::H, SimPose::Heart),
            (Key::N, SimPose::Hidden),
        ].iter() {
            if one_shot(key) {
                events.push(SimInput::Pose(pose));
            }
        }
        if held(Key::Up)   { events.push(SimInput::PinchWider); }
        if held(Key::Down) { events.push(SimInput::PinchNarrower); }

        if one_shot(Key::LeftBracket)  { input.quality_step -= 1; }
        if one_shot(Key::RightBracket) { input.quality_step += 1; }
        if one_shot(Key::Minus)        { input.sensitivity_step -= 1; }
        if one_shot(Key::Equal)        { input.sensitivity_step += 1; }

        if let Some((_, dy)) = self.window.get_scroll_wheel() {
            input.wheel = -dy * WHEEL_UNITS;
        }

        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
            let (w, h) = self.window.get_size();
            let p = (mx / w.max(1) as f32, my / h.max(1) as f32);
            if self.pointer != Some(p) {
                self.pointer = Some(p);
                events.push(SimInput::Pointer(p.0, p.1));
            }
        }

        // The simulator may already be gone (hardware mode); input is then
        // simply ignored.
        for event in events {
            let _ = self.sim_tx.send(event);
        }
        input
    }

    /// Rasterise the presented scene, draw the status bar and show it.
    pub fn show(&mut self, status: &str) -> Result<()> {
        self.renderer.render();

        let (w, h) = (self.renderer.width(), self.renderer.height());
        let bar_y = h.saturating_sub(STATUS_H);
        self.renderer.fill_rect(0, bar_y, w, STATUS_H, TEXT_BG);
        self.renderer.draw_label(status, 10, bar_y + 6, 2, TEXT_COLOR);
        self.renderer.draw_label(LEGEND, 10, h.saturating_sub(12), 1, LEGEND_COLOR);

        self.window
            .update_with_buffer(self.renderer.buffer(), w, h)
            .map_err(|e| ViewerError::Window(e.to_string()))
    }
}
