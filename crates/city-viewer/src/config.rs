//! Startup arguments and the fixed viewer tunables.

use clap::Parser;
use glam::Vec3;
use std::path::PathBuf;

/// Model loaded when no `--model` is given.
pub const DEFAULT_MODEL_PATH: &str = "models/low_poly_city.glb";

/// `city_viewer` - interactive viewer for an animated glTF city model.
///
/// Opens a window, loads the model in the background, plays every embedded
/// animation clip and lets the user orbit the camera around the city.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the `.glb` / `.gltf` model to display.
    #[arg(long, env = "CITY_VIEWER_MODEL", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

/// Authoring-time constants. Not exposed on the command line.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Clear colour as 0xRRGGBB (sRGB).
    pub background: u32,
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    /// Position of the directional light; it shines towards the origin.
    pub directional_position: Vec3,

    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,
    pub orbit_target: Vec3,
    pub damping_factor: f32,

    /// Uniform scale applied to the loaded model.
    pub model_scale: f32,
    /// Multiplier applied to frame delta time before it reaches the clips.
    pub playback_rate: f32,
    pub max_pixel_ratio: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background: 0x87ceeb,
            ambient_intensity: 2.4,
            directional_intensity: 1.8,
            directional_position: Vec3::Y,
            fov_y_deg: 75.0,
            near: 0.1,
            far: 100.0,
            camera_position: Vec3::new(-0.06, 1.7, 3.8),
            orbit_target: Vec3::new(0.0, 0.75, 0.0),
            damping_factor: 0.05,
            model_scale: 0.025,
            playback_rate: 0.5,
            max_pixel_ratio: 2.0,
        }
    }
}
