//! The rendering orchestrator. Owns the GPU context, the drawing-buffer
//! targets and the pipelines, and turns a scene plus camera into a
//! presented frame.

pub mod context;
pub mod pipelines;
pub mod resources;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{blit::BlitPass, mesh::MeshPipeline},
    resources::GpuScene,
    targets::Targets,
};
use crate::camera::PerspectiveCamera;
use crate::render_loop::FrameSink;
use crate::scene::SceneGraph;
use crate::viewport::{OutputSurface, ViewportSize};
use std::sync::Arc;
use winit::window::Window;

pub struct Renderer {
    window: Arc<Window>,
    pub gfx: GfxContext,
    pub targets: Targets,
    mesh: MeshPipeline,
    blit: BlitPass,
    blit_bind: wgpu::BindGroup,
    gpu_scene: GpuScene,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window.clone()).await?;
        let format = gfx.config.format;

        let targets = Targets::new(&gfx.device, gfx.size, format);
        let mesh = MeshPipeline::new(&gfx.device, targets.color_fmt, targets.depth_fmt);
        let blit = BlitPass::new(&gfx.device, format);
        let blit_bind = blit.bind(&gfx.device, &targets.color);
        let gpu_scene = GpuScene::new(&gfx.device, &gfx.queue, &mesh);

        Ok(Self {
            window,
            gfx,
            targets,
            mesh,
            blit,
            blit_bind,
            gpu_scene,
        })
    }

    /// Reconfigures the swap chain after it was lost or went stale.
    pub fn recover_surface(&mut self) {
        log::warn!("Surface lost or outdated; reconfiguring");
        let size = self.window.inner_size();
        if size != self.gfx.size {
            self.gfx.resize(size);
        } else {
            self.gfx.reconfigure();
        }
    }

    fn render_scene(
        &mut self,
        swap_view: &wgpu::TextureView,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) {
        let device = &self.gfx.device;
        let queue = &self.gfx.queue;
        self.gpu_scene.sync(device, queue, &self.mesh, scene);
        self.gpu_scene.write_instances(device, queue, &self.mesh, scene);
        self.mesh.write_frame(queue, scene, camera);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        // Pass 1: scene into the drawing buffer
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.gpu_scene.draw(&mut pass, &self.mesh);
        }

        // Pass 2: drawing buffer onto the swap chain
        self.blit.draw(&mut encoder, &self.blit_bind, swap_view);

        queue.submit(std::iter::once(encoder.finish()));
    }
}

impl OutputSurface for Renderer {
    fn apply_viewport(&mut self, viewport: &ViewportSize) {
        self.gfx.resize(self.window.inner_size());
        let buffer = viewport.drawing_buffer_size();
        if self.targets.resize(&self.gfx.device, buffer) {
            self.blit_bind = self.blit.bind(&self.gfx.device, &self.targets.color);
            log::debug!(
                "Drawing buffer {}x{} (pixel ratio {})",
                buffer.width,
                buffer.height,
                viewport.pixel_ratio
            );
        }
    }
}

impl FrameSink for Renderer {
    type Error = wgpu::SurfaceError;

    fn draw(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), Self::Error> {
        let frame = self.gfx.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_scene(&view, scene, camera);
        frame.present();
        Ok(())
    }

    fn request_next_frame(&self) {
        self.window.request_redraw();
    }
}
