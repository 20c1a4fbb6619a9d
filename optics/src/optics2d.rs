use std::fmt;

use serde::{Deserialize, Serialize};

use units::todo::{Lengthf32, Ratiof32};

use crate::{Affine1D, OpticsError};

/// Transverse axis of a plane: `x` carries the (s, u) coordinates, `y` the
/// (t, v) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis { X, Y }

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Separable optical system: independent affine maps along `x` and `y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Optics2D {
    x: Affine1D,
    y: Affine1D,
}

impl Optics2D {
    pub fn new(x: Affine1D, y: Affine1D) -> Self { Self { x, y } }

    pub fn identity() -> Self { Self::new(Affine1D::identity(), Affine1D::identity()) }

    pub fn translation(distance: Lengthf32) -> Self { Self::translation_xy(distance, distance) }

    pub fn translation_xy(dx: Lengthf32, dy: Lengthf32) -> Self {
        Self::new(Affine1D::translation(dx), Affine1D::translation(dy))
    }

    /// Isotropic thin lens centred at `(cx, cy)`
    pub fn refraction(focal_length: Lengthf32, (cx, cy): (Lengthf32, Lengthf32)) -> Result<Self, OpticsError> {
        Self::refraction_xy(focal_length, cx, focal_length, cy)
    }

    /// Thin lens with different focal lengths along the two axes
    pub fn refraction_xy(fx: Lengthf32, cx: Lengthf32,
                         fy: Lengthf32, cy: Lengthf32) -> Result<Self, OpticsError> {
        let x = Affine1D::refraction(fx, cx).map_err(|e| e.on_axis(Axis::X))?;
        let y = Affine1D::refraction(fy, cy).map_err(|e| e.on_axis(Axis::Y))?;
        Ok(Self::new(x, y))
    }

    /// `self ∘ rhs`, axis by axis
    pub fn compose(&self, rhs: &Self) -> Self {
        Self::new(self.x.compose(&rhs.x), self.y.compose(&rhs.y))
    }

    pub fn then  (&self, other: &Self) -> Self { other.compose(self) }
    pub fn before(&self, other: &Self) -> Self { self.compose(other) }

    pub fn invert(&self) -> Result<Self, OpticsError> {
        let x = self.x.invert().map_err(|e| e.on_axis(Axis::X))?;
        let y = self.y.invert().map_err(|e| e.on_axis(Axis::Y))?;
        Ok(Self::new(x, y))
    }

    pub fn x(&self) -> &Affine1D { &self.x }
    pub fn y(&self) -> &Affine1D { &self.y }

    pub fn axis(&self, axis: Axis) -> &Affine1D {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Map a ray given by its `(s, u)` and `(t, v)` pairs
    pub fn ray(&self, (s, u): (Lengthf32, Ratiof32), (t, v): (Lengthf32, Ratiof32))
               -> ((Lengthf32, Ratiof32), (Lengthf32, Ratiof32)) {
        (self.x.ray(s, u), self.y.ray(t, v))
    }

    /// Per-axis distance at which the system brings rays from a point back
    /// into focus
    pub fn focused_distance(&self) -> (Lengthf32, Lengthf32) {
        (self.x.focused_distance(), self.y.focused_distance())
    }
}

impl fmt::Display for Optics2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Optics2D {{x: {}, y: {}}}", self.x, self.y)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};
    use float_eq::assert_float_eq;

    #[test]
    fn lens_leaves_ray_on_its_axis_untouched() {
        let lens = Optics2D::refraction(5.0, (12.0, 32.0)).unwrap();
        let (x, y) = lens.ray((12.0, 0.0), (32.0, 0.0));
        assert_float_eq!(x, (12.0, 0.0), abs <= (1e-6, 1e-6));
        assert_float_eq!(y, (32.0, 0.0), abs <= (1e-6, 1e-6));
    }

    #[test]
    fn axes_are_independent() {
        let system = Optics2D::translation_xy(2.0, -3.0)
            .then(&Optics2D::refraction_xy(10.0, 0.0, 20.0, 1.0).unwrap());
        assert_eq!(system.x(), &Affine1D::translation(2.0).then(&Affine1D::refraction(10.0, 0.0).unwrap()));
        assert_eq!(system.y(), &Affine1D::translation(-3.0).then(&Affine1D::refraction(20.0, 1.0).unwrap()));
        assert_eq!(system.axis(Axis::Y), system.y());
    }

    #[test]
    fn composition_with_translation_by_500() {
        let lens = Optics2D::refraction(12.0, (32.0, 5.0)).unwrap();
        let gap  = Optics2D::translation(500.0);
        let system = lens.then(&gap);
        // A ray parallel to the axis of the lens crosses it at the focal point
        let (x, y) = system.ray((40.0, 0.0), (5.0, 0.0));
        assert_float_eq!(x, (40.0 - 500.0 * 8.0 / 12.0, -8.0 / 12.0), rmax <= (1e-5, 1e-5));
        assert_float_eq!(y.0, 5.0, abs <= 1e-4);
        assert_float_eq!(y.1, 0.0, abs <= 1e-6);
    }

    #[test]
    fn failing_axis_is_reported() {
        let err = Optics2D::refraction_xy(10.0, 0.0, 0.0, 0.0).unwrap_err();
        assert_eq!(err, OpticsError::ZeroFocalLength.on_axis(Axis::Y));
        assert_eq!(err.root_cause(), &OpticsError::ZeroFocalLength);
        assert_eq!(err.to_string(), "y axis: a thin lens with zero focal length has no defined optical power");

        let singular = Affine1D::from_coefficients(1.0, 1.0, 1.0, 1.0, 0.0, 0.0);
        let err = Optics2D::new(singular, Affine1D::identity()).invert().unwrap_err();
        assert!(matches!(err, OpticsError::OnAxis { axis: Axis::X, .. }));
    }

    #[test]
    fn inverse_is_axis_wise() {
        let system = Optics2D::translation_xy(30.0, 40.0)
            .then(&Optics2D::refraction_xy(25.0, 1.0, 15.0, -2.0).unwrap());
        let inverse = system.invert().unwrap();
        assert_eq!(inverse.x(), &system.x().invert().unwrap());
        assert_eq!(inverse.y(), &system.y().invert().unwrap());
        let roundtrip = system.then(&inverse);
        for axis in Axis::BOTH {
            assert_float_eq!(roundtrip.axis(axis).coefficients(),
                             Affine1D::identity().coefficients(),
                             abs_all <= 1e-4);
        }
    }

    #[test]
    fn focused_distance_per_axis() {
        let system = Optics2D::translation(60.0)
            .then(&Optics2D::refraction_xy(20.0, 0.0, 30.0, 0.0).unwrap());
        let (fx, fy) = system.focused_distance();
        assert_float_eq!(fx,  30.0, rmax <= 1e-5);
        assert_float_eq!(fy,  60.0, rmax <= 1e-5);
    }
}
