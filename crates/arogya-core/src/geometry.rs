//! Planar joint geometry over normalized landmarks.

use nalgebra::Vector2;

use crate::types::Landmark;

/// Angle at vertex `b` of the triangle `a`-`b`-`c`, in degrees.
///
/// Returns 0 when either arm has zero length.
pub fn angle_between(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let ba: Vector2<f64> = a.to_point2() - b.to_point2();
    let bc: Vector2<f64> = c.to_point2() - b.to_point2();
    let norms = ba.norm() * bc.norm();
    if norms == 0.0 {
        0.0
    } else {
        (ba.dot(&bc) / norms).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Straight-line distance between two landmarks in normalized frame units
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    nalgebra::distance(&a.to_point2(), &b.to_point2())
}

/// Midpoint between two landmarks (visibility is the weaker of the two)
pub fn midpoint(a: &Landmark, b: &Landmark) -> Landmark {
    Landmark::new(
        (a.x + b.x) / 2.0,
        (a.y + b.y) / 2.0,
        a.visibility.min(b.visibility),
    )
}
