//! Everything the render loop reads and mutates each frame.

use crate::animation::{AnimationDriver, AnimationMixer};
use crate::camera::{CameraRig, OrbitControls, PerspectiveCamera};
use crate::config::ViewerConfig;
use crate::data::{LoadError, LoadedModel};
use crate::scene::{AmbientLight, Color, DirectionalLight, SceneGraph};
use crate::viewport::{apply_resize, OutputSurface, ViewportSize};
use glam::Vec3;

/// Scene, camera, animation binding and current viewport.
#[derive(Debug)]
pub struct ViewerContext {
    pub scene: SceneGraph,
    pub rig: CameraRig,
    pub animation: AnimationDriver,
    pub viewport: ViewportSize,
    pub config: ViewerConfig,
}

impl ViewerContext {
    /// Builds the empty scene with its lights and the orbiting camera.
    pub fn new(config: ViewerConfig, viewport: ViewportSize) -> Self {
        let scene = SceneGraph::new(
            Color::from_srgb_hex(config.background),
            AmbientLight {
                color: Color::WHITE,
                intensity: config.ambient_intensity,
            },
            DirectionalLight {
                color: Color::WHITE,
                intensity: config.directional_intensity,
                position: config.directional_position,
                target: Vec3::ZERO,
            },
        );

        let camera = PerspectiveCamera::new(
            config.fov_y_deg,
            viewport.aspect(),
            config.near,
            config.far,
            config.camera_position,
        );
        let mut controls = OrbitControls::new(config.orbit_target);
        controls.enable_damping = true;
        controls.damping_factor = config.damping_factor;

        Self {
            scene,
            rig: CameraRig::new(camera, controls),
            animation: AnimationDriver::new(config.playback_rate),
            viewport,
            config,
        }
    }

    /// Records the new viewport and pushes it to the camera and `surface`.
    pub fn resize<S: OutputSurface + ?Sized>(&mut self, viewport: ViewportSize, surface: &mut S) {
        self.viewport = viewport;
        apply_resize(&self.viewport, &mut self.rig.camera, surface);
    }

    /// Takes the outcome of the background load.
    ///
    /// On success the model is added to the scene at the configured scale
    /// and every clip it carries starts playing. A failure leaves the scene
    /// as it was and is handed back for the caller to report.
    pub fn on_model_loaded(&mut self, result: Result<LoadedModel, LoadError>) -> Result<(), LoadError> {
        let mut model = result?;
        let inserted = self.scene.insert_model(&mut model, self.config.model_scale);

        let mut clips = std::mem::take(&mut model.clips);
        for clip in &mut clips {
            clip.retarget(&inserted.node_map);
        }
        log::info!(
            "Model added to scene with {} nodes; playing {} clip(s)",
            inserted.node_map.len(),
            clips.len()
        );

        let mut mixer = AnimationMixer::new(inserted.root, clips);
        mixer.play_all();
        if self.animation.bind(mixer).is_err() {
            log::warn!("A model was already loaded; its animation keeps playing");
        }
        Ok(())
    }
}
