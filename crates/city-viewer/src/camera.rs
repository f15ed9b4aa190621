use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

const EPS: f32 = 1e-6;
/// Squared distance under which the camera counts as stationary.
const MOVE_EPS: f32 = 1e-6;

/// A right-handed perspective camera with 0..1 clip depth.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub up: Vec3,

    // --- Derived state ---
    /// Point the camera looks at; refreshed by `look_at`.
    focus: Vec3,
    /// Cached projection; refreshed by `update_projection_matrix`.
    proj: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32, position: Vec3) -> Self {
        let mut camera = Self {
            fov_y_deg,
            aspect,
            near,
            far,
            position,
            up: Vec3::Y,
            focus: Vec3::ZERO,
            proj: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the projection from `fov_y_deg`, `aspect`, `near` and `far`.
    /// Must be called after changing any of them.
    pub fn update_projection_matrix(&mut self) {
        self.proj = Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.focus = target;
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.proj
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.focus, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view_matrix()
    }
}

/// Spherical coordinates around a target, Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius < EPS {
            return Self { radius: 0.0, phi: 0.0, theta: 0.0 };
        }
        Self {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_r = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_r * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_r * self.theta.cos(),
        )
    }
}

/// Orbits a camera around `target`, easing pending input in over several
/// updates when damping is enabled.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    // --- Pending input ---
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
    last_position: Vec3,
    last_target: Vec3,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            last_position: Vec3::splat(f32::NAN),
            last_target: Vec3::splat(f32::NAN),
        }
    }

    /// Queues a rotation around the vertical axis.
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    /// Queues a change of polar angle.
    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Moves the camera towards the target by `factor` (> 1 zooms in).
    pub fn dolly_in(&mut self, factor: f32) {
        self.scale /= factor;
    }

    pub fn dolly_out(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Queues a screen-space pan of `(dx, dy)` pixels on a viewport
    /// `viewport_height` pixels tall.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &PerspectiveCamera) {
        let distance = (camera.position - self.target).length()
            * (camera.fov_y_deg.to_radians() / 2.0).tan();
        let world_per_px = 2.0 * distance / viewport_height.max(1.0);

        let view = camera.view_matrix().inverse();
        let right = view.x_axis.truncate();
        let up = view.y_axis.truncate();
        self.pan_offset += -right * dx * world_per_px * self.pan_speed;
        self.pan_offset += up * dy * world_per_px * self.pan_speed;
    }

    /// Zoom factor for one wheel notch.
    pub fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Pending rotation as `(theta, phi)`.
    pub fn pending_rotation(&self) -> (f32, f32) {
        (self.delta_theta, self.delta_phi)
    }

    /// Applies pending input to `camera` and points it at the target.
    /// Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        let step = if self.enable_damping { self.damping_factor } else { 1.0 };
        spherical.theta += self.delta_theta * step;
        spherical.phi += self.delta_phi * step;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = !(self.last_position.distance_squared(camera.position) <= MOVE_EPS
            && self.last_target.distance_squared(self.target) <= MOVE_EPS);
        self.last_position = camera.position;
        self.last_target = self.target;
        moved
    }
}

/// Translates window input into orbit-control commands.
#[derive(Debug, Default)]
pub struct CameraController {
    rotating: bool,
    panning: bool,
    last_mouse: Option<(f64, f64)>,
}

impl CameraController {
    /// Creates a new controller with default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles window events, queueing input on `controls`.
    ///
    /// `viewport_height` is in physical pixels, matching cursor positions.
    pub fn handle_event(
        &mut self,
        event: &WindowEvent,
        controls: &mut OrbitControls,
        camera: &PerspectiveCamera,
        viewport_height: f32,
    ) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.rotating = pressed,
                    MouseButton::Right | MouseButton::Middle => self.panning = pressed,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor((position.x, position.y), controls, camera, viewport_height);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_mouse = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                // Scrolling up zooms in.
                let factor = controls.zoom_scale().powf(scroll.abs()).recip();
                if scroll > 0.0 {
                    controls.dolly_in(factor);
                } else if scroll < 0.0 {
                    controls.dolly_out(factor);
                }
            }
            _ => {}
        }
    }

    fn handle_cursor(
        &mut self,
        xy: (f64, f64),
        controls: &mut OrbitControls,
        camera: &PerspectiveCamera,
        viewport_height: f32,
    ) {
        if let Some(last) = self.last_mouse {
            let dx = (xy.0 - last.0) as f32;
            let dy = (xy.1 - last.1) as f32;
            let height = viewport_height.max(1.0);

            if self.rotating {
                controls.rotate_left(TAU * dx / height * controls.rotate_speed);
                controls.rotate_up(TAU * dy / height * controls.rotate_speed);
            } else if self.panning {
                controls.pan(dx, dy, height, camera);
            }
        }
        self.last_mouse = Some(xy);
    }
}

/// The projection camera together with the controller that steers it.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
}

impl CameraRig {
    pub fn new(mut camera: PerspectiveCamera, controls: OrbitControls) -> Self {
        camera.look_at(controls.target);
        Self { camera, controls }
    }

    /// Advances the controller's damping by one step.
    pub fn update(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }
}
