//! Offscreen targets the scene pass renders into.
//!
//! They are sized to the drawing buffer (logical size times the capped
//! pixel ratio), which can differ from the swap chain.

pub struct Targets {
    _color_tex: wgpu::Texture,
    _depth_tex: wgpu::Texture,

    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,

    pub color_fmt: wgpu::TextureFormat,
    pub depth_fmt: wgpu::TextureFormat,
    size: winit::dpi::PhysicalSize<u32>,
}

impl Targets {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(
        device: &wgpu::Device,
        size: winit::dpi::PhysicalSize<u32>,
        color_fmt: wgpu::TextureFormat,
    ) -> Self {
        let size = winit::dpi::PhysicalSize::new(size.width.max(1), size.height.max(1));
        let depth_fmt = Self::DEPTH_FORMAT;

        let tex_size = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };

        let create_tex = |label: &str, format, usage| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: tex_size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let color_tex = create_tex(
            "Drawing Buffer Color",
            color_fmt,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth_tex = create_tex(
            "Drawing Buffer Depth",
            depth_fmt,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            _depth_tex: depth_tex,
            color_fmt,
            depth_fmt,
            size,
        }
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    /// Recreates the targets if `size` differs from the current one.
    /// Returns whether anything was recreated.
    pub fn resize(&mut self, device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) -> bool {
        let size = winit::dpi::PhysicalSize::new(size.width.max(1), size.height.max(1));
        if size == self.size {
            return false;
        }
        *self = Self::new(device, size, self.color_fmt);
        true
    }
}
