//! Window size bookkeeping and resize propagation.
//!
//! Sizes are tracked in logical pixels. The drawing buffer is
//! `logical * pixel_ratio`, where the pixel ratio is the device scale factor
//! capped at [`ViewportSize::MAX_PIXEL_RATIO`] by default.

use crate::camera::PerspectiveCamera;
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    /// Logical width, always >= 1.
    pub width: u32,
    /// Logical height, always >= 1.
    pub height: u32,
    /// Applied pixel ratio, `min(device ratio, cap)`.
    pub pixel_ratio: f64,
}

impl ViewportSize {
    pub const MAX_PIXEL_RATIO: f64 = 2.0;

    /// Builds the viewport from a logical surface size and the device pixel ratio.
    pub fn from_logical(width: u32, height: u32, device_pixel_ratio: f64, max_ratio: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: capped_pixel_ratio(device_pixel_ratio, max_ratio),
        }
    }

    /// Builds the viewport from a window's physical size and scale factor.
    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64, max_ratio: f64) -> Self {
        let logical = size.to_logical::<f64>(scale_factor);
        Self::from_logical(
            logical.width.round() as u32,
            logical.height.round() as u32,
            scale_factor,
            max_ratio,
        )
    }

    /// Width over height, computed on every call.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Pixel dimensions of the buffer the scene is drawn into.
    pub fn drawing_buffer_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(
            ((self.width as f64 * self.pixel_ratio).floor() as u32).max(1),
            ((self.height as f64 * self.pixel_ratio).floor() as u32).max(1),
        )
    }
}

/// Clamps a device pixel ratio into `(0, max_ratio]`. Non-finite or
/// non-positive inputs fall back to 1.
pub fn capped_pixel_ratio(device_pixel_ratio: f64, max_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(max_ratio)
    } else {
        1.0
    }
}

/// The surface pixels are drawn to.
pub trait OutputSurface {
    /// Resizes the drawing buffer to `viewport.drawing_buffer_size()`.
    fn apply_viewport(&mut self, viewport: &ViewportSize);
}

/// Propagates a new viewport to the camera projection and the output surface.
pub fn apply_resize<S: OutputSurface + ?Sized>(
    viewport: &ViewportSize,
    camera: &mut PerspectiveCamera,
    surface: &mut S,
) {
    camera.aspect = viewport.aspect();
    camera.update_projection_matrix();
    surface.apply_viewport(viewport);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[derive(Default)]
    struct FakeSurface {
        size: Option<PhysicalSize<u32>>,
        pixel_ratio: Option<f64>,
        calls: usize,
    }

    impl OutputSurface for FakeSurface {
        fn apply_viewport(&mut self, viewport: &ViewportSize) {
            self.size = Some(viewport.drawing_buffer_size());
            self.pixel_ratio = Some(viewport.pixel_ratio);
            self.calls += 1;
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0, Vec3::new(0.0, 0.0, 5.0))
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        for (device, applied) in [(1.0, 1.0), (2.0, 2.0), (3.0, 2.0)] {
            let vp = ViewportSize::from_logical(800, 600, device, ViewportSize::MAX_PIXEL_RATIO);
            assert_eq!(vp.pixel_ratio, applied, "device ratio {device}");
        }
    }

    #[test]
    fn bogus_device_ratio_falls_back_to_one() {
        assert_eq!(capped_pixel_ratio(0.0, 2.0), 1.0);
        assert_eq!(capped_pixel_ratio(f64::NAN, 2.0), 1.0);
    }

    #[test]
    fn startup_scenario_high_dpi() {
        let vp = ViewportSize::from_logical(800, 600, 3.0, ViewportSize::MAX_PIXEL_RATIO);
        let mut cam = camera();
        let mut surface = FakeSurface::default();
        apply_resize(&vp, &mut cam, &mut surface);

        assert_eq!(vp.pixel_ratio, 2.0);
        assert!((cam.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(surface.size, Some(PhysicalSize::new(1600, 1200)));
    }

    #[test]
    fn resize_updates_aspect_and_projection() {
        let mut cam = camera();
        let mut surface = FakeSurface::default();
        let start = ViewportSize::from_logical(800, 600, 1.0, 2.0);
        apply_resize(&start, &mut cam, &mut surface);
        let before = cam.projection_matrix();

        let wide = ViewportSize::from_logical(1600, 600, 1.0, 2.0);
        apply_resize(&wide, &mut cam, &mut surface);
        assert!((cam.aspect - 1600.0 / 600.0).abs() < 1e-6);
        assert_ne!(before, cam.projection_matrix());

        let resized = ViewportSize::from_logical(1024, 768, 1.0, 2.0);
        apply_resize(&resized, &mut cam, &mut surface);
        assert!((cam.aspect - 1024.0 / 768.0).abs() < 1e-6);
        assert_eq!(surface.size, Some(PhysicalSize::new(1024, 768)));
        assert!(surface.pixel_ratio.unwrap() <= 2.0);
    }

    #[test]
    fn resize_is_idempotent() {
        let mut cam = camera();
        let mut surface = FakeSurface::default();
        let vp = ViewportSize::from_logical(1024, 768, 1.5, 2.0);

        apply_resize(&vp, &mut cam, &mut surface);
        let (aspect, proj, size) = (cam.aspect, cam.projection_matrix(), surface.size);
        apply_resize(&vp, &mut cam, &mut surface);

        assert_eq!(cam.aspect, aspect);
        assert_eq!(cam.projection_matrix(), proj);
        assert_eq!(surface.size, size);
        assert_eq!(surface.calls, 2);
    }

    #[test]
    fn physical_size_is_converted_to_logical() {
        let vp = ViewportSize::from_physical(PhysicalSize::new(2400, 1800), 3.0, 2.0);
        assert_eq!((vp.width, vp.height), (800, 600));
        assert_eq!(vp.drawing_buffer_size(), PhysicalSize::new(1600, 1200));
    }

    #[test]
    fn zero_sized_window_is_clamped() {
        let vp = ViewportSize::from_logical(0, 0, 1.0, 2.0);
        assert_eq!((vp.width, vp.height), (1, 1));
        assert_eq!(vp.aspect(), 1.0);
    }
}
