//! Light and colour definitions for the scene.

use glam::Vec3;

/// A linear RGB colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Vec3);

impl Color {
    pub const WHITE: Self = Self(Vec3::ONE);

    /// Decodes a 0xRRGGBB sRGB value into linear RGB.
    pub fn from_srgb_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self(Vec3::new(channel(16), channel(8), channel(0)))
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.0.x as f64,
            g: self.0.y as f64,
            b: self.0.z as f64,
            a: 1.0,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Uniform light reaching every surface equally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// A sun-like light shining from `position` towards `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the surface towards the light.
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target).try_normalize().unwrap_or(Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_blue_decodes_to_linear() {
        let c = Color::from_srgb_hex(0x87ceeb);
        assert!((c.0.x - 0.2423).abs() < 1e-3);
        assert!((c.0.y - 0.6172).abs() < 1e-3);
        assert!((c.0.z - 0.8308).abs() < 1e-3);
    }

    #[test]
    fn degenerate_light_points_up() {
        let light = DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::ZERO,
            target: Vec3::ZERO,
        };
        assert_eq!(light.to_light(), Vec3::Y);
    }
}
