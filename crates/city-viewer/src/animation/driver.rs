//! Feeds frame time into the bound mixer at a fixed playback rate.

use super::mixer::AnimationMixer;
use crate::scene::SceneGraph;

/// Something that can be advanced by a time step against a scene.
pub trait Mixer {
    fn update(&mut self, delta: f32, scene: &mut SceneGraph);
}

impl Mixer for AnimationMixer {
    fn update(&mut self, delta: f32, scene: &mut SceneGraph) {
        AnimationMixer::update(self, delta, scene)
    }
}

/// Holds the optional animation binding. Until a binding exists,
/// [`advance`](Self::advance) does nothing.
#[derive(Debug)]
pub struct AnimationDriver<M = AnimationMixer> {
    binding: Option<M>,
    playback_rate: f32,
}

impl<M: Mixer> AnimationDriver<M> {
    pub fn new(playback_rate: f32) -> Self {
        Self {
            binding: None,
            playback_rate,
        }
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    /// Installs the binding. A binding is created at most once; later calls
    /// are refused and hand the mixer back.
    pub fn bind(&mut self, mixer: M) -> Result<(), M> {
        if self.binding.is_some() {
            log::warn!("Animation binding already present; ignoring a second one");
            return Err(mixer);
        }
        self.binding = Some(mixer);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn binding(&self) -> Option<&M> {
        self.binding.as_ref()
    }

    /// Moves every active clip forward by `delta * playback_rate` seconds.
    pub fn advance(&mut self, delta: f32, scene: &mut SceneGraph) {
        if let Some(mixer) = self.binding.as_mut() {
            mixer.update(delta * self.playback_rate, scene);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip::{AnimationClip, Interpolation, Track, TrackValues};
    use crate::scene::{test_scene, SceneNode, Transform};
    use glam::Vec3;

    /// Records the simulated time it has been advanced by.
    #[derive(Debug, Default)]
    struct RecordingClip {
        advanced: f32,
        calls: usize,
    }

    impl Mixer for RecordingClip {
        fn update(&mut self, delta: f32, _scene: &mut SceneGraph) {
            self.advanced += delta;
            self.calls += 1;
        }
    }

    #[test]
    fn advance_without_binding_is_a_no_op() {
        let mut scene = test_scene();
        let mut driver: AnimationDriver<RecordingClip> = AnimationDriver::new(0.5);
        for _ in 0..10 {
            driver.advance(0.016, &mut scene);
        }
        assert!(!driver.is_bound());
    }

    #[test]
    fn advance_scales_by_playback_rate() {
        let mut scene = test_scene();
        let mut driver = AnimationDriver::new(0.5);
        driver.bind(RecordingClip::default()).unwrap();

        driver.advance(0.0, &mut scene);
        assert_eq!(driver.binding().unwrap().advanced, 0.0);

        for d in [0.1f32, 0.25, 0.016] {
            let before = driver.binding().unwrap().advanced;
            driver.advance(d, &mut scene);
            let step = driver.binding().unwrap().advanced - before;
            assert!((step - 0.5 * d).abs() < 1e-7);
        }
        assert_eq!(driver.binding().unwrap().calls, 4);
    }

    #[test]
    fn second_binding_is_refused() {
        let mut driver = AnimationDriver::new(0.5);
        driver.bind(RecordingClip::default()).unwrap();
        let rejected = driver.bind(RecordingClip { advanced: 9.0, calls: 0 });
        assert_eq!(rejected.unwrap_err().advanced, 9.0);
        assert_eq!(driver.binding().unwrap().advanced, 0.0);
    }

    #[test]
    fn bound_mixer_with_two_clips_plays_at_half_speed() {
        let mut scene = test_scene();
        let node = scene.add_node(SceneNode::new("sign", Transform::IDENTITY), None);
        let clip = |to: Vec3| {
            AnimationClip::new(
                None,
                vec![Track {
                    target: node,
                    times: vec![0.0, 10.0],
                    values: TrackValues::Translation(vec![Vec3::ZERO, to]),
                    interpolation: Interpolation::Linear,
                }],
            )
        };
        let mut mixer = AnimationMixer::new(node, vec![clip(Vec3::X), clip(Vec3::Y)]);
        mixer.play_all();

        let mut driver = AnimationDriver::new(0.5);
        driver.bind(mixer).unwrap();

        driver.advance(0.0, &mut scene);
        assert!(driver.binding().unwrap().actions().iter().all(|a| a.time() == 0.0));

        driver.advance(0.1, &mut scene);
        for action in driver.binding().unwrap().actions() {
            assert!((action.time() - 0.05).abs() < 1e-7);
        }
    }
}
