//! Pose (position, Euler rotation, scale) and its matrix form.
//!
//! Rotations are Euler angles in degrees applied Z, then X, then Y (rotation matrix
//! `R = Ry * Rx * Rz`), matching the convention most scene editors display.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

const DECOMPOSE_EPS: f32 = 1e-8;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    /// Euler angles in degrees.
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: [0.0; 3],
        rotation: [0.0; 3],
        scale: [1.0; 3],
    };

    pub fn new(position: [f32; 3], rotation: [f32; 3], scale: [f32; 3]) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Rotation as a unit quaternion.
    pub fn rotation_quat(&self) -> UnitQuaternion<f32> {
        let [x, y, z] = self.rotation.map(f32::to_radians);
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z)
    }

    /// Homogeneous TRS matrix.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::from(self.position))
            * self.rotation_quat().to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&Vector3::from(self.scale))
    }

    /// Decompose an affine matrix into translation, rotation and per-axis scale.
    ///
    /// Shear cannot be represented and is dropped; a negative determinant is folded into the
    /// X scale.
    pub fn from_matrix(m: &Matrix4<f32>) -> Pose {
        let position = [m[(0, 3)], m[(1, 3)], m[(2, 3)]];
        let basis: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();

        let mut scale = [
            basis.column(0).norm(),
            basis.column(1).norm(),
            basis.column(2).norm(),
        ];
        if scale.iter().any(|s| *s < DECOMPOSE_EPS) {
            return Pose {
                position,
                rotation: [0.0; 3],
                scale,
            };
        }
        if basis.determinant() < 0.0 {
            scale[0] = -scale[0];
        }

        let unscaled = Matrix3::from_columns(&[
            basis.column(0).into_owned() / scale[0],
            basis.column(1).into_owned() / scale[1],
            basis.column(2).into_owned() / scale[2],
        ]);
        let rotation = euler_zxy_degrees(&Rotation3::from_matrix(&unscaled));
        Pose {
            position,
            rotation,
            scale,
        }
    }

    /// Component-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &Pose, eps: f32) -> bool {
        let close = |a: &[f32; 3], b: &[f32; 3]| a.iter().zip(b).all(|(x, y)| (x - y).abs() <= eps);
        close(&self.position, &other.position)
            && close(&self.rotation, &other.rotation)
            && close(&self.scale, &other.scale)
    }
}

/// Extract Z-X-Y Euler angles (degrees) from a rotation.
pub fn euler_zxy_degrees(r: &Rotation3<f32>) -> [f32; 3] {
    let m = r.matrix();
    let sx = (-m[(1, 2)]).clamp(-1.0, 1.0);
    let x = sx.asin();
    let (y, z) = if x.cos() > 1e-6 {
        (m[(0, 2)].atan2(m[(2, 2)]), m[(1, 0)].atan2(m[(1, 1)]))
    } else {
        // Gimbal lock: fold the Z turn into Y.
        ((-m[(2, 0)]).atan2(m[(0, 0)]), 0.0)
    };
    [x.to_degrees(), y.to_degrees(), z.to_degrees()]
}
