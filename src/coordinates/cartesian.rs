//! # Local Aim Vectors
//!
//! Conversion between [`Horizontal`] directions and unit vectors in the
//! observer's local east-north-up (ENU) frame.
//!
//! ## Frame Convention
//!
//! - **X**: points east (azimuth 90°)
//! - **Y**: points north (azimuth 0°)
//! - **Z**: points to the zenith (altitude 90°)
//!
//! Device orientation sensors report a rotation matrix that takes device
//! coordinates into this frame. The third column of that matrix is where
//! the device's Z axis points, and it is used as the aim direction.
//!
//! ## Examples
//!
//! ```rust
//! use pointtosky::coordinates::cartesian::{horizontal_to_vector, vector_to_horizontal};
//! use pointtosky::Horizontal;
//!
//! let east = horizontal_to_vector(&Horizontal::new(90.0, 0.0));
//! assert!((east.x - 1.0).abs() < 1e-12);
//!
//! let back = vector_to_horizontal(&east).unwrap();
//! assert!((back.az_deg - 90.0).abs() < 1e-9);
//! ```

use nalgebra::{Matrix3, Vector3};

use crate::coordinates::angle::{deg_to_rad, rad_to_deg};
use crate::coordinates::Horizontal;
use crate::errors::MathError;

/// Unit vector in the ENU frame for a horizontal direction
pub fn horizontal_to_vector(h: &Horizontal) -> Vector3<f64> {
    let az = deg_to_rad(h.az_deg);
    let alt = deg_to_rad(h.alt_deg);
    let cos_alt = alt.cos();
    Vector3::new(cos_alt * az.sin(), cos_alt * az.cos(), alt.sin())
}

/// Horizontal direction of an ENU vector of any non-zero length
///
/// # Errors
///
/// - [`MathError::ZeroVector`] when the vector has zero length
/// - [`MathError::DegenerateGeometry`] when any component is not finite
pub fn vector_to_horizontal(v: &Vector3<f64>) -> Result<Horizontal, MathError> {
    let unit = normalize(v)?;
    let alt = rad_to_deg(unit.z.clamp(-1.0, 1.0).asin());
    let az = rad_to_deg(unit.x.atan2(unit.y));
    Ok(Horizontal::new(az, alt))
}

/// Normalizes a vector to unit length
pub fn normalize(v: &Vector3<f64>) -> Result<Vector3<f64>, MathError> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(MathError::DegenerateGeometry(format!(
            "non-finite vector [{}, {}, {}]",
            v.x, v.y, v.z
        )));
    }
    let norm = v.norm();
    if norm == 0.0 {
        return Err(MathError::ZeroVector);
    }
    Ok(v / norm)
}

/// Aim direction from a device rotation matrix (device to ENU)
///
/// Takes the forward column and converts it to azimuth/altitude.
pub fn aim_from_rotation(rotation: &Matrix3<f64>) -> Result<Horizontal, MathError> {
    let forward: Vector3<f64> = rotation.column(2).into_owned();
    vector_to_horizontal(&forward)
}

/// Same as [`aim_from_rotation`] for a row-major 9-element matrix
pub fn aim_from_row_major(m: &[f64; 9]) -> Result<Horizontal, MathError> {
    aim_from_rotation(&Matrix3::from_row_slice(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0, Vector3::new(0.0, 1.0, 0.0))]
    #[case(90.0, 0.0, Vector3::new(1.0, 0.0, 0.0))]
    #[case(180.0, 0.0, Vector3::new(0.0, -1.0, 0.0))]
    #[case(270.0, 0.0, Vector3::new(-1.0, 0.0, 0.0))]
    #[case(0.0, 90.0, Vector3::new(0.0, 0.0, 1.0))]
    fn test_cardinal_directions(#[case] az: f64, #[case] alt: f64, #[case] expected: Vector3<f64>) {
        let v = horizontal_to_vector(&Horizontal::new(az, alt));
        assert_abs_diff_eq!(v, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_round_trip() {
        for az in (0..360).step_by(15) {
            for alt in (-75..=75).step_by(15) {
                let h = Horizontal::new(az as f64, alt as f64);
                // Scale to check that length does not matter
                let v = horizontal_to_vector(&h) * 3.5;
                let back = vector_to_horizontal(&v).unwrap();
                assert_abs_diff_eq!(back.alt_deg, h.alt_deg, epsilon = 1e-9);
                let daz = (back.az_deg - h.az_deg + 540.0) % 360.0 - 180.0;
                assert!(daz.abs() < 1e-9, "az {} -> {}", h.az_deg, back.az_deg);
            }
        }
    }

    #[test]
    fn test_zero_vector_is_rejected() {
        let result = vector_to_horizontal(&Vector3::zeros());
        assert_eq!(result, Err(MathError::ZeroVector));
    }

    #[test]
    fn test_non_finite_vector_is_rejected() {
        let result = vector_to_horizontal(&Vector3::new(f64::NAN, 0.0, 1.0));
        assert!(matches!(result, Err(MathError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_aim_from_rotation_uses_forward_column() {
        // Device Z axis pointing at the zenith
        let identity = Matrix3::identity();
        let aim = aim_from_rotation(&identity).unwrap();
        assert_abs_diff_eq!(aim.alt_deg, 90.0, epsilon = 1e-9);

        // Device Z axis pointing east, on the horizon
        let m = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let aim = aim_from_row_major(&m).unwrap();
        assert_abs_diff_eq!(aim.az_deg, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(aim.alt_deg, 0.0, epsilon = 1e-9);
    }
}
