//! # celestial_viewer
//!
//! Desktop viewer for the celestial particle scene: a minifb window with a
//! software rasteriser behind the scene's render-backend contract, a
//! keyboard/mouse hand simulator and, optionally, a LeapMotion tracker.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: keys pick a hand pose, the mouse moves it.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Hand |
//! |---|---|
//! | `F` | Fist: collapse into the heart |
//! | `O` | Open palm: expand into the galaxy |
//! | `R` | Relaxed: hold the current shape |
//! | `P` | Pinch; `Up` / `Down` widen or narrow it to zoom |
//! | `H` | Two-hand heart |
//! | `N` | No hand in view |
//! | wheel | Zoom; dive past the threshold to detonate |
//! | `[` / `]` | Particle quality −/+ 10 % |
//! | `-` / `=` | Detection sensitivity −/+ 10 |
//! | `Q` / `Esc` | Quit |

pub mod app;
pub mod error;
pub mod raster;
pub mod tracking;
pub mod visualizer;

pub use error::{Result, ViewerError};
