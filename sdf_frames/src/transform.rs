//! Rigid transforms
//!
//! Poses are nalgebra isometries in f64. The text form is the six-number
//! `x y z roll pitch yaw` used by SDF documents, with fixed-axis roll/pitch/yaw
//! angles in radians.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// Rigid transform (translation + rotation)
pub type Pose = Isometry3<f64>;

/// Build a pose from a translation and roll/pitch/yaw angles
pub fn pose_from_xyz_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Pose {
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

/// Build a pure translation
pub fn pose_from_translation(x: f64, y: f64, z: f64) -> Pose {
    Isometry3::translation(x, y, z)
}

/// Decode `x y z roll pitch yaw`; blank text is the identity
pub fn parse_pose(text: &str) -> Option<Pose> {
    let values = parse_floats(text)?;
    match values.as_slice() {
        [] => Some(Pose::identity()),
        [x, y, z, roll, pitch, yaw] => Some(pose_from_xyz_rpy(*x, *y, *z, *roll, *pitch, *yaw)),
        _ => None,
    }
}

/// Encode a pose as `x y z roll pitch yaw`
pub fn format_pose(pose: &Pose) -> String {
    let t = pose.translation.vector;
    let (roll, pitch, yaw) = pose.rotation.euler_angles();
    format!("{} {} {} {} {} {}", t.x, t.y, t.z, roll, pitch, yaw)
}

/// Decode `x y z`
pub fn parse_vector3(text: &str) -> Option<Vector3<f64>> {
    match parse_floats(text)?.as_slice() {
        [x, y, z] => Some(Vector3::new(*x, *y, *z)),
        _ => None,
    }
}

fn parse_floats(text: &str) -> Option<Vec<f64>> {
    text.split_whitespace()
        .map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Compare two poses by translation distance and rotation angle
pub fn poses_equal(a: &Pose, b: &Pose, tolerance: f64) -> bool {
    let dt = (a.translation.vector - b.translation.vector).norm();
    let dr = a.rotation.angle_to(&b.rotation);
    dt <= tolerance && dr <= tolerance
}
