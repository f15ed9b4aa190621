//! Keyframe tracks and clips.

use crate::scene::{NodeId, Transform};
use glam::{Quat, Vec3, Vec4};

/// How values between two keyframes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Hermite spline. Values are stored as `[in_tangent, value, out_tangent]`
    /// triplets per keyframe.
    CubicSpline,
}

/// Keyframe values for one animated property.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Translation(Vec<Vec3>),
    /// Rotations stored as raw `xyzw` so spline tangents survive intact.
    Rotation(Vec<Vec4>),
    Scale(Vec<Vec3>),
}

impl TrackValues {
    fn len(&self) -> usize {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }
}

/// A keyframed property of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub target: NodeId,
    /// Keyframe times in seconds, ascending.
    pub times: Vec<f32>,
    pub values: TrackValues,
    pub interpolation: Interpolation,
}

impl Track {
    /// Checks that the value count matches the keyframe count for the
    /// interpolation mode.
    pub fn is_well_formed(&self) -> bool {
        let per_key = match self.interpolation {
            Interpolation::CubicSpline => 3,
            _ => 1,
        };
        !self.times.is_empty() && self.values.len() == self.times.len() * per_key
    }

    /// Samples the track at `t` and writes the result into `transform`.
    /// Malformed tracks leave the transform untouched.
    pub fn apply(&self, t: f32, transform: &mut Transform) {
        if !self.is_well_formed() {
            return;
        }
        match &self.values {
            TrackValues::Translation(v) => {
                transform.translation = sample(&self.times, v, t, self.interpolation, Vec3::lerp);
            }
            TrackValues::Scale(v) => {
                transform.scale = sample(&self.times, v, t, self.interpolation, Vec3::lerp);
            }
            TrackValues::Rotation(v) => {
                let q = sample(&self.times, v, t, self.interpolation, |a, b, s| {
                    Vec4::from(Quat::from_vec4(a).slerp(Quat::from_vec4(b), s))
                });
                transform.rotation = Quat::from_vec4(q).normalize();
            }
        }
    }

    /// Time of the last keyframe.
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

/// Samples a keyframe sequence at `t`, holding the first/last value outside
/// the key range.
fn sample<T>(
    times: &[f32],
    values: &[T],
    t: f32,
    interpolation: Interpolation,
    lerp: impl Fn(T, T, f32) -> T,
) -> T
where
    T: Copy + std::ops::Add<Output = T> + std::ops::Mul<f32, Output = T>,
{
    let value_at = |key: usize| match interpolation {
        Interpolation::CubicSpline => values[key * 3 + 1],
        _ => values[key],
    };

    let last = times.len() - 1;
    if t <= times[0] {
        return value_at(0);
    }
    if t >= times[last] {
        return value_at(last);
    }

    // First key strictly after t; within 1..=last because of the clamps above.
    let next = times.partition_point(|&k| k <= t);
    let prev = next - 1;
    let span = times[next] - times[prev];
    let s = if span > 0.0 { (t - times[prev]) / span } else { 0.0 };

    match interpolation {
        Interpolation::Step => value_at(prev),
        Interpolation::Linear => lerp(value_at(prev), value_at(next), s),
        Interpolation::CubicSpline => {
            let p0 = values[prev * 3 + 1];
            let m0 = values[prev * 3 + 2] * span;
            let p1 = values[next * 3 + 1];
            let m1 = values[next * 3] * span;
            let (h00, h10, h01, h11) = hermite_weights(s);
            p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
        }
    }
}

/// Hermite basis weights for `s` in `[0, 1]`.
fn hermite_weights(s: f32) -> (f32, f32, f32, f32) {
    let s2 = s * s;
    let s3 = s2 * s;
    (
        2.0 * s3 - 3.0 * s2 + 1.0,
        s3 - 2.0 * s2 + s,
        -2.0 * s3 + 3.0 * s2,
        s3 - s2,
    )
}

/// A named set of tracks played together.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: Option<String>,
    pub tracks: Vec<Track>,
    duration: f32,
}

impl AnimationClip {
    pub fn new(name: Option<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::duration).fold(0.0, f32::max);
        Self {
            name,
            tracks,
            duration,
        }
    }

    /// Length of the clip in seconds (time of its latest keyframe).
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Rewrites track targets through `map` (indexed by current target).
    /// Tracks whose target has no entry are dropped.
    pub fn retarget(&mut self, map: &[NodeId]) {
        self.tracks.retain_mut(|track| match map.get(track.target.index()) {
            Some(&id) => {
                track.target = id;
                true
            }
            None => {
                log::warn!(
                    "Dropping track for clip {:?}: target {} out of range",
                    self.name,
                    track.target.index()
                );
                false
            }
        });
    }
}
