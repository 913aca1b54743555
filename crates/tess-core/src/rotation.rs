use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ROTATION_SPEED, SECOND_PLANE_RATIO};
use crate::quaternion::Quaternion;
use crate::topology::Vertex4D;

const Z_AXIS: [f64; 3] = [0.0, 0.0, 1.0];
const X_AXIS: [f64; 3] = [1.0, 0.0, 0.0];

/// Clamp a rotation speed (radians per tick) into `[0, MAX_ROTATION_SPEED]`.
/// NaN maps to 0 so a faulty producer freezes the motion instead of
/// poisoning both quaternions.
pub fn clamp_rotation_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return 0.0;
    }
    speed.clamp(0.0, MAX_ROTATION_SPEED)
}

/// Orientation of the hypercube in 4-space, held as two unit quaternions.
///
/// `q1` rotates the X-Y-Z subspace. `q2` rotates the plane spanned by the
/// intermediate z′ and the original w. `q2` only ever accumulates X-axis
/// increments, which keeps the embedded (z′, w) pair inside its plane and
/// makes `rotate` norm-preserving.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    q1: Quaternion,
    q2: Quaternion,
    second_plane_ratio: f64,
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationState {
    /// Both planes at rest.
    pub fn new() -> Self {
        Self {
            q1: Quaternion::identity(),
            q2: Quaternion::identity(),
            second_plane_ratio: SECOND_PLANE_RATIO,
        }
    }

    /// Start from explicit angles: `q1` about Z by `xyz_angle`, `q2` about X
    /// by `zw_angle`.
    pub fn from_angles(xyz_angle: f64, zw_angle: f64) -> Self {
        Self {
            q1: Quaternion::from_axis_angle(Z_AXIS, xyz_angle),
            q2: Quaternion::from_axis_angle(X_AXIS, zw_angle),
            ..Self::new()
        }
    }

    /// Random start: uniform `q1` on S³, `q2` an X-axis rotation by a uniform
    /// angle.
    pub fn random(rng: &mut impl Rng) -> Self {
        let zw_angle = std::f64::consts::TAU * rng.random::<f64>();
        Self {
            q1: Quaternion::random(rng),
            q2: Quaternion::from_axis_angle(X_AXIS, zw_angle),
            ..Self::new()
        }
    }

    /// Override the Z′-W speed ratio. Non-finite ratios are ignored.
    pub fn with_second_plane_ratio(mut self, ratio: f64) -> Self {
        if ratio.is_finite() {
            self.second_plane_ratio = ratio;
        }
        self
    }

    pub fn q1(&self) -> Quaternion {
        self.q1
    }

    pub fn q2(&self) -> Quaternion {
        self.q2
    }

    /// Advance both planes by one tick.
    ///
    /// `q = normalize(q ⊗ Δq)` for each quaternion, Δq1 about Z by `speed`,
    /// Δq2 about X by `speed * ratio`. Returns the clamped speed actually used.
    pub fn step(&mut self, rotation_speed: f64) -> f64 {
        let speed = clamp_rotation_speed(rotation_speed);
        let dq1 = Quaternion::from_axis_angle(Z_AXIS, speed);
        let dq2 = Quaternion::from_axis_angle(X_AXIS, speed * self.second_plane_ratio);
        self.q1 = (self.q1 * dq1).normalize();
        self.q2 = (self.q2 * dq2).normalize();
        speed
    }

    /// Rotate a point by the current orientation. Pure.
    ///
    /// (x, y, z) is conjugated by `q1` giving (x′, y′, z′). The pair (z′, w)
    /// is then carried as the (y, z) part of a pure quaternion and conjugated
    /// by `q2` giving (z″, w″). Result: (x′, y′, z″, w″).
    pub fn rotate(&self, point: Vertex4D) -> Vertex4D {
        let [x1, y1, z1] = self.q1.rotate_vector([point.x, point.y, point.z]);
        let [_, z2, w2] = self.q2.rotate_vector([0.0, z1, point.w]);
        Vertex4D::new(x1, y1, z2, w2)
    }
}
