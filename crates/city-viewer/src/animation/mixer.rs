//! Plays clips against the nodes of a scene.

use super::clip::AnimationClip;
use crate::scene::{NodeId, SceneGraph};

/// What happens when an action reaches the end of its clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop on the last frame.
    Once,
    /// Wrap around to the start, forever.
    #[default]
    Repeat,
}

/// Playback state of one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    clip: usize,
    time: f32,
    playing: bool,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
}

impl AnimationAction {
    fn new(clip: usize) -> Self {
        Self {
            clip,
            time: 0.0,
            playing: false,
            time_scale: 1.0,
            loop_mode: LoopMode::default(),
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&mut self) {
        self.playing = false;
        self.time = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.playing
    }

    /// Local clip time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn clip_index(&self) -> usize {
        self.clip
    }

    fn advance(&mut self, delta: f32, duration: f32) {
        if !self.playing {
            return;
        }
        self.time += delta * self.time_scale;
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        match self.loop_mode {
            LoopMode::Repeat => self.time = self.time.rem_euclid(duration),
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.playing = false;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.playing = false;
                }
            }
        }
    }
}

/// Clips bound to a scene subtree, one action per clip.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    root: NodeId,
    clips: Vec<AnimationClip>,
    actions: Vec<AnimationAction>,
    time: f32,
}

impl AnimationMixer {
    /// Binds `clips` (already targeting scene node ids) to the subtree at `root`.
    pub fn new(root: NodeId, clips: Vec<AnimationClip>) -> Self {
        let actions = (0..clips.len()).map(AnimationAction::new).collect();
        Self {
            root,
            clips,
            actions,
            time: 0.0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    /// The action driving clip `index`.
    pub fn clip_action(&mut self, index: usize) -> Option<&mut AnimationAction> {
        self.actions.get_mut(index)
    }

    pub fn play_all(&mut self) {
        self.actions.iter_mut().for_each(AnimationAction::play);
    }

    /// Total time advanced, in mixer seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances every running action by `delta` seconds and writes the
    /// sampled pose into the target nodes.
    pub fn update(&mut self, delta: f32, scene: &mut SceneGraph) {
        self.time += delta;
        for action in &mut self.actions {
            if !action.is_running() {
                continue;
            }
            let clip = &self.clips[action.clip];
            action.advance(delta, clip.duration());
            for track in &clip.tracks {
                if let Some(node) = scene.node_mut(track.target) {
                    track.apply(action.time, &mut node.transform);
                }
            }
        }
    }
}
