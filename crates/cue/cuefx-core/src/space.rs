//! Anchor-relative coordinate-space conversion.
//!
//! A stored pose is expressed in its anchor's local frame when an anchor is set and in world
//! space otherwise. When the anchor changes the pose is pushed through
//! `worldToLocal(new) * localToWorld(old)` so that it stays visually in place.

use log::warn;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// How a pose is carried through an anchor matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PosePolicy {
    /// Position as a point; rotation and scale as free vectors through the same matrix.
    /// Inexact under rotated or non-uniformly scaled anchors; kept for parity with
    /// existing authored data.
    #[default]
    LegacyVectorTransform,
    /// Compose the full TRS matrix and decompose the result.
    ExactComposition,
}

/// Apply `m` to `pose` under the given policy.
pub fn transform_pose(m: &Matrix4<f32>, pose: &Pose, policy: PosePolicy) -> Pose {
    match policy {
        PosePolicy::LegacyVectorTransform => {
            let p = m.transform_point(&Point3::from(pose.position));
            let r = m.transform_vector(&Vector3::from(pose.rotation));
            let s = m.transform_vector(&Vector3::from(pose.scale));
            Pose {
                position: [p.x, p.y, p.z],
                rotation: [r.x, r.y, r.z],
                scale: [s.x, s.y, s.z],
            }
        }
        PosePolicy::ExactComposition => Pose::from_matrix(&(m * pose.to_matrix())),
    }
}

/// Inverse of a local-to-world matrix, if it has one.
#[inline]
pub fn world_to_local(local_to_world: &Matrix4<f32>) -> Option<Matrix4<f32>> {
    local_to_world.try_inverse()
}

/// Matrix that re-expresses a pose from the `from` anchor frame into the `to` anchor frame.
/// `None` on either side stands for world space. Returns `None` when nothing needs to change
/// or when the target anchor is singular.
pub fn rebase_matrix(
    from: Option<&Matrix4<f32>>,
    to: Option<&Matrix4<f32>>,
) -> Option<Matrix4<f32>> {
    match (from, to) {
        (None, None) => None,
        (Some(a), None) => Some(*a),
        (None, Some(b)) => world_to_local(b),
        (Some(a), Some(b)) => world_to_local(b).map(|inv| inv * a),
    }
}

/// Convert a stored pose between anchor frames (no live instance involved).
pub fn convert_pose(
    pose: &Pose,
    from: Option<&Matrix4<f32>>,
    to: Option<&Matrix4<f32>>,
    policy: PosePolicy,
) -> Pose {
    if from.is_none() && to.is_none() {
        return *pose;
    }
    match rebase_matrix(from, to) {
        Some(m) => transform_pose(&m, pose, policy),
        None => {
            warn!("anchor matrix is not invertible; keeping stored pose unchanged");
            *pose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(position: [f32; 3], rotation: [f32; 3], scale: f32) -> Matrix4<f32> {
        Pose::new(position, rotation, [scale; 3]).to_matrix()
    }

    #[test]
    fn no_anchor_to_no_anchor_is_identity() {
        let pose = Pose::new([1.0, 2.0, 3.0], [10.0, 0.0, 0.0], [1.0; 3]);
        let out = convert_pose(&pose, None, None, PosePolicy::LegacyVectorTransform);
        assert_eq!(out, pose);
    }

    #[test]
    fn attach_expresses_position_in_anchor_frame() {
        let a = anchor([10.0, 0.0, 0.0], [0.0; 3], 2.0);
        let pose = Pose::from_position([12.0, 4.0, 0.0]);
        let out = convert_pose(&pose, None, Some(&a), PosePolicy::LegacyVectorTransform);
        assert!(out.approx_eq(
            &Pose::new([1.0, 2.0, 0.0], [0.0; 3], [0.5; 3]),
            1e-5
        ));
    }

    #[test]
    fn legacy_treats_rotation_as_vector() {
        let a = anchor([0.0; 3], [0.0, 90.0, 0.0], 1.0);
        let local = Pose::new([0.0; 3], [0.0, 0.0, 10.0], [1.0; 3]);
        let world = convert_pose(&local, Some(&a), None, PosePolicy::LegacyVectorTransform);
        // (0,0,10) rotated by +90 deg yaw becomes (10,0,0): the angle vector is turned,
        // not composed.
        assert!((world.rotation[0] - 10.0).abs() < 1e-4);
        assert!(world.rotation[2].abs() < 1e-4);
    }

    #[test]
    fn exact_composes_rotation() {
        let a = anchor([0.0; 3], [0.0, 90.0, 0.0], 1.0);
        let local = Pose::IDENTITY;
        let world = convert_pose(&local, Some(&a), None, PosePolicy::ExactComposition);
        assert!((world.rotation[1] - 90.0).abs() < 1e-3);
        let legacy = convert_pose(&local, Some(&a), None, PosePolicy::LegacyVectorTransform);
        assert!(legacy.rotation.iter().all(|r| r.abs() < 1e-6));
    }

    #[test]
    fn anchor_to_anchor_keeps_world_placement() {
        let a = anchor([1.0, 0.0, 0.0], [0.0; 3], 1.0);
        let b = anchor([0.0, 5.0, 0.0], [0.0; 3], 1.0);
        let local_a = Pose::from_position([2.0, 0.0, 0.0]);
        let local_b = convert_pose(&local_a, Some(&a), Some(&b), PosePolicy::LegacyVectorTransform);
        assert!(local_b.approx_eq(&Pose::from_position([3.0, -5.0, 0.0]), 1e-5));
    }

    #[test]
    fn singular_anchor_leaves_pose_alone() {
        let flat = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        let pose = Pose::from_position([1.0, 1.0, 1.0]);
        let out = convert_pose(&pose, None, Some(&flat), PosePolicy::LegacyVectorTransform);
        assert_eq!(out, pose);
    }
}
