// src/lib.rs
//! Interactive viewer for an animated low-poly city.
//!
//! Loads a glTF model in the background, plays its animation clips at a
//! reduced rate and renders it with a damped orbit camera into a window
//! whose drawing buffer follows the window size and pixel density.

pub mod animation;
pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod viewport;
