//! Time-driven animation: keyframe clips, the mixer that plays them and the
//! driver the render loop advances each frame.

pub mod clip;
pub mod driver;
pub mod mixer;

pub use clip::{AnimationClip, Interpolation, Track, TrackValues};
pub use driver::{AnimationDriver, Mixer};
pub use mixer::{AnimationAction, AnimationMixer, LoopMode};
