//! Entry point for the city viewer.

use anyhow::Result;
use city_viewer::{
    camera::CameraController,
    config::{Args, ViewerConfig},
    context::ViewerContext,
    data::spawn_model_load,
    render_loop::{shutdown_channel, RenderLoop, TickOutcome},
    renderer::Renderer,
    viewport::ViewportSize,
};
use clap::Parser;
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Args::parse();
    let config = ViewerConfig::default();
    log::info!("Starting city viewer with {:?}", args);

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("City Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(args.width, args.height))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let max_ratio = config.max_pixel_ratio;
    let viewport = ViewportSize::from_physical(window.inner_size(), window.scale_factor(), max_ratio);
    let mut ctx = ViewerContext::new(config, viewport);
    ctx.resize(viewport, &mut renderer);

    let mut controller = CameraController::new();
    let mut pending = spawn_model_load(args.model.clone());
    let (trigger, token) = shutdown_channel();
    let mut render_loop = RenderLoop::new(token);

    // First frame; every later one is requested by the loop itself.
    window.request_redraw();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                let height = renderer.gfx.size.height as f32;
                controller.handle_event(&event, &mut ctx.rig.controls, &ctx.rig.camera, height);

                if requests_exit(&event) {
                    log::info!("Shutting down");
                    trigger.trigger();
                    elwt.exit();
                    return;
                }

                match event {
                    WindowEvent::Resized(size) => {
                        let vp = ViewportSize::from_physical(size, window.scale_factor(), max_ratio);
                        ctx.resize(vp, &mut renderer);
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        let vp = ViewportSize::from_physical(window.inner_size(), scale_factor, max_ratio);
                        ctx.resize(vp, &mut renderer);
                    }
                    WindowEvent::RedrawRequested => match render_loop.tick(&mut ctx, &mut renderer) {
                        Ok(TickOutcome::Frame { .. }) => {}
                        Ok(TickOutcome::Stopped) => {
                            log::info!("Shutting down");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            renderer.recover_surface();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU out of memory, exiting.");
                            trigger.trigger();
                        }
                        Err(e) => log::warn!("Skipping frame: {:?}", e),
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if let Some(result) = pending.poll() {
                    if let Err(err) = ctx.on_model_loaded(result) {
                        log::error!("Failed to load model {:?}: {:#}", args.model, anyhow::Error::new(err));
                    }
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}

/// Close button or Escape ends the session.
fn requests_exit(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::CloseRequested => true,
        WindowEvent::KeyboardInput { event, .. } => {
            event.physical_key == PhysicalKey::Code(KeyCode::Escape)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn close_request_exits() {
        assert!(requests_exit(&WindowEvent::CloseRequested));
    }

    #[test]
    fn ordinary_events_keep_running() {
        assert!(!requests_exit(&WindowEvent::Resized(PhysicalSize::new(800, 600))));
        assert!(!requests_exit(&WindowEvent::RedrawRequested));
        assert!(!requests_exit(&WindowEvent::Focused(false)));
    }
}
