//! The per-frame pipeline: clock, animation, camera, draw, reschedule.

use crate::camera::PerspectiveCamera;
use crate::clock::{FrameClock, MonotonicClock, TimeSource};
use crate::context::ViewerContext;
use crate::scene::SceneGraph;
use tokio::sync::watch;

/// Whether any frame has been produced yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// What a [`RenderLoop::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A frame was processed; `delta` seconds passed since the previous one.
    Frame { delta: f32 },
    /// Shutdown was requested. Nothing was drawn or scheduled.
    Stopped,
}

/// Requests that the loop stop. Dropping it has the same effect.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Observes a [`ShutdownTrigger`].
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownToken { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl ShutdownToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}

/// Where finished frames go.
pub trait FrameSink {
    type Error;

    /// Renders the scene from the camera's viewpoint.
    fn draw(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), Self::Error>;

    /// Asks for another [`RenderLoop::tick`] on the next display refresh.
    fn request_next_frame(&self);
}

#[derive(Debug)]
pub struct RenderLoop<T = MonotonicClock> {
    clock: FrameClock<T>,
    state: LoopState,
    shutdown: ShutdownToken,
}

impl RenderLoop<MonotonicClock> {
    pub fn new(shutdown: ShutdownToken) -> Self {
        Self::with_time_source(MonotonicClock::new(), shutdown)
    }
}

impl<T: TimeSource> RenderLoop<T> {
    pub fn with_time_source(source: T, shutdown: ShutdownToken) -> Self {
        Self {
            clock: FrameClock::new(source),
            state: LoopState::Idle,
            shutdown,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs one frame.
    ///
    /// The next frame is requested even when drawing fails, so a transient
    /// surface error does not stall the loop. The draw error is still
    /// returned for the caller to act on.
    pub fn tick<S: FrameSink + ?Sized>(
        &mut self,
        ctx: &mut ViewerContext,
        sink: &mut S,
    ) -> Result<TickOutcome, S::Error> {
        if self.shutdown.is_cancelled() {
            return Ok(TickOutcome::Stopped);
        }
        if self.state == LoopState::Idle {
            log::debug!("Render loop started");
            self.state = LoopState::Running;
        }

        let delta = self.clock.tick().delta as f32;
        ctx.animation.advance(delta, &mut ctx.scene);
        ctx.rig.update();

        let drawn = sink.draw(&ctx.scene, &ctx.rig.camera);
        sink.request_next_frame();
        drawn.map(|()| TickOutcome::Frame { delta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ScriptedTime;
    use crate::config::ViewerConfig;
    use crate::data::model::{LoadedModel, ModelNode};
    use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
    use crate::scene::NodeId;
    use crate::viewport::ViewportSize;
    use glam::Vec3;
    use std::cell::RefCell;

    #[derive(Debug, PartialEq)]
    enum Call {
        Draw { camera: Vec3 },
        Schedule,
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: RefCell<Vec<Call>>,
        fail_draws: bool,
    }

    impl FrameSink for RecordingSink {
        type Error = &'static str;

        fn draw(&mut self, _scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), Self::Error> {
            self.calls.borrow_mut().push(Call::Draw { camera: camera.position });
            if self.fail_draws {
                Err("surface lost")
            } else {
                Ok(())
            }
        }

        fn request_next_frame(&self) {
            self.calls.borrow_mut().push(Call::Schedule);
        }
    }

    fn context() -> ViewerContext {
        ViewerContext::new(
            ViewerConfig::default(),
            ViewportSize::from_logical(800, 600, 1.0, 2.0),
        )
    }

    #[test]
    fn first_tick_starts_loop_and_draws_then_schedules() {
        let (_trigger, token) = shutdown_channel();
        let mut lp = RenderLoop::with_time_source(ScriptedTime::new([0.0]), token);
        let mut ctx = context();
        let mut sink = RecordingSink::default();

        assert_eq!(lp.state(), LoopState::Idle);
        let outcome = lp.tick(&mut ctx, &mut sink).unwrap();
        assert_eq!(outcome, TickOutcome::Frame { delta: 0.0 });
        assert_eq!(lp.state(), LoopState::Running);

        let calls = sink.calls.into_inner();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Call::Draw { .. }));
        assert_eq!(calls[1], Call::Schedule);
    }

    #[test]
    fn camera_is_updated_before_drawing() {
        let (_trigger, token) = shutdown_channel();
        let mut lp = RenderLoop::with_time_source(ScriptedTime::new([0.0]), token);
        let mut ctx = context();
        ctx.rig.controls.rotate_left(1.0);
        let mut sink = RecordingSink::default();

        lp.tick(&mut ctx, &mut sink).unwrap();
        let calls = sink.calls.into_inner();
        assert_eq!(calls[0], Call::Draw { camera: ctx.rig.camera.position });
        assert_ne!(ctx.rig.camera.position, Vec3::new(-0.06, 1.7, 3.8));
    }

    fn animated_model() -> LoadedModel {
        LoadedModel {
            nodes: vec![ModelNode::default()],
            roots: vec![0],
            clips: vec![AnimationClip::new(
                None,
                vec![Track {
                    target: NodeId::from_index(0),
                    times: vec![0.0, 10.0],
                    values: TrackValues::Translation(vec![Vec3::ZERO, Vec3::X * 10.0]),
                    interpolation: Interpolation::Linear,
                }],
            )],
            ..LoadedModel::default()
        }
    }

    #[test]
    fn animation_receives_scaled_frame_delta() {
        let (_trigger, token) = shutdown_channel();
        let mut lp = RenderLoop::with_time_source(ScriptedTime::new([0.0, 0.1, 0.3]), token);
        let mut ctx = context();
        ctx.on_model_loaded(Ok(animated_model())).unwrap();
        let mut sink = RecordingSink::default();

        let times: Vec<f32> = (0..3)
            .map(|_| {
                lp.tick(&mut ctx, &mut sink).unwrap();
                ctx.animation.binding().unwrap().actions()[0].time()
            })
            .collect();
        assert_eq!(times[0], 0.0);
        assert!((times[1] - 0.05).abs() < 1e-6);
        assert!((times[2] - 0.15).abs() < 1e-6);
    }

    #[test]
    fn late_model_only_sees_frames_after_it_loads() {
        let (_trigger, token) = shutdown_channel();
        let mut lp =
            RenderLoop::with_time_source(ScriptedTime::new([0.0, 0.5, 1.0, 1.2]), token);
        let mut ctx = context();
        let mut sink = RecordingSink::default();
        for _ in 0..3 {
            lp.tick(&mut ctx, &mut sink).unwrap();
        }
        assert!(!ctx.animation.is_bound());

        ctx.on_model_loaded(Ok(animated_model())).unwrap();
        match lp.tick(&mut ctx, &mut sink) {
            Ok(TickOutcome::Frame { delta }) => assert!((delta - 0.2).abs() < 1e-6),
            other => panic!("expected a frame, got {other:?}"),
        }
        let time = ctx.animation.binding().unwrap().actions()[0].time();
        assert!((time - 0.1).abs() < 1e-6, "clip time {time}");
    }

    #[test]
    fn ticks_without_model_still_draw() {
        let (_trigger, token) = shutdown_channel();
        let mut lp = RenderLoop::with_time_source(ScriptedTime::new([0.0, 0.016, 0.032]), token);
        let mut ctx = context();
        let mut sink = RecordingSink::default();
        for _ in 0..3 {
            lp.tick(&mut ctx, &mut sink).unwrap();
        }
        assert_eq!(sink.calls.borrow().len(), 6);
        assert!(!ctx.animation.is_bound());
    }

    #[test]
    fn failed_draw_still_schedules_next_frame() {
        let (_trigger, token) = shutdown_channel();
        let mut lp = RenderLoop::with_time_source(ScriptedTime::new([0.0]), token);
        let mut ctx = context();
        let mut sink = RecordingSink {
            fail_draws: true,
            ..RecordingSink::default()
        };
        assert_eq!(lp.tick(&mut ctx, &mut sink), Err("surface lost"));
        assert_eq!(sink.calls.borrow().last(), Some(&Call::Schedule));
    }

    #[test]
    fn shutdown_stops_drawing_and_scheduling() {
        let (trigger, token) = shutdown_channel();
        let mut lp = RenderLoop::with_time_source(ScriptedTime::new([0.0, 1.0]), token);
        let mut ctx = context();
        let mut sink = RecordingSink::default();
        lp.tick(&mut ctx, &mut sink).unwrap();

        trigger.trigger();
        assert_eq!(lp.tick(&mut ctx, &mut sink), Ok(TickOutcome::Stopped));
        assert_eq!(sink.calls.borrow().len(), 2);
    }

    #[test]
    fn dropped_trigger_cancels_token() {
        let (trigger, token) = shutdown_channel();
        assert!(!token.is_cancelled());
        drop(trigger);
        assert!(token.is_cancelled());
    }
}
