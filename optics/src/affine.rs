use std::fmt;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

use units::todo::{Lengthf32, Ratiof32};

use crate::OpticsError;

/// Affine map acting on a ray's (position, angle) pair along one axis:
///
/// ```text
/// p' = pp * p + pa * a + cp
/// a' = ap * p + aa * a + ca
/// ```
///
/// Equality is exact, coefficient by coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine1D {
    pp: f32,
    pa: f32,
    ap: f32,
    aa: f32,
    cp: f32,
    ca: f32,
}

/// Relative size below which the determinant of the linear part is treated as
/// zero.
const SINGULAR: f64 = 1e-12;

impl Affine1D {
    pub fn from_coefficients(pp: f32, pa: f32, ap: f32, aa: f32, cp: f32, ca: f32) -> Self {
        Self { pp, pa, ap, aa, cp, ca }
    }

    pub fn identity() -> Self {
        Self::from_coefficients(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Free-space propagation over `distance`: the position moves by
    /// `distance * angle`, the angle is unchanged.
    pub fn translation(distance: Lengthf32) -> Self {
        Self::from_coefficients(1.0, distance, 0.0, 1.0, 0.0, 0.0)
    }

    /// Thin lens of the given focal length, with its optical axis at `center`.
    ///
    /// The position is unchanged; the angle is deflected by
    /// `-(p - center) / focal_length`.
    pub fn refraction(focal_length: Lengthf32, center: Lengthf32) -> Result<Self, OpticsError> {
        if focal_length == 0.0 { return Err(OpticsError::ZeroFocalLength) }
        Ok(Self::from_coefficients(1.0, 0.0, -1.0 / focal_length, 1.0, 0.0, center / focal_length))
    }

    /// `self ∘ rhs`: the map which applies `rhs` first, then `self`.
    pub fn compose(&self, rhs: &Self) -> Self {
        let (l, r) = (self, rhs);
        Self {
            pp: l.pp * r.pp + l.pa * r.ap,
            pa: l.pp * r.pa + l.pa * r.aa,
            ap: l.ap * r.pp + l.aa * r.ap,
            aa: l.ap * r.pa + l.aa * r.aa,
            cp: l.cp + l.pp * r.cp + l.pa * r.ca,
            ca: l.ca + l.ap * r.cp + l.aa * r.ca,
        }
    }

    /// Apply `self` first, then `other`
    pub fn then(&self, other: &Self) -> Self { other.compose(self) }

    /// Apply `other` first, then `self`
    pub fn before(&self, other: &Self) -> Self { self.compose(other) }

    pub fn invert(&self) -> Result<Self, OpticsError> {
        let Self { pp, pa, ap, aa, cp, ca } = *self;
        let diagonal = pp as f64 * aa as f64;
        let cross    = pa as f64 * ap as f64;
        let det = diagonal - cross;
        let scale = diagonal.abs().max(cross.abs());
        if !det.is_finite() || det == 0.0 || det.abs() <= SINGULAR * scale {
            return Err(OpticsError::NonInvertible { determinant: det as f32 });
        }
        let det = det as f32;
        let (pp_, pa_, ap_, aa_) = (aa / det, -pa / det, -ap / det, pp / det);
        Ok(Self {
            pp: pp_, pa: pa_,
            ap: ap_, aa: aa_,
            cp: -(pp_ * cp + pa_ * ca),
            ca: -(ap_ * cp + aa_ * ca),
        })
    }

    /// Map a ray given by its position and angle
    pub fn ray(&self, p: Lengthf32, a: Ratiof32) -> (Lengthf32, Ratiof32) {
        (self.pp * p + self.pa * a + self.cp,
         self.ap * p + self.aa * a + self.ca)
    }

    pub fn determinant(&self) -> f32 { self.pp * self.aa - self.pa * self.ap }

    /// `[pp, pa, ap, aa, cp, ca]`
    pub fn coefficients(&self) -> [f32; 6] {
        [self.pp, self.pa, self.ap, self.aa, self.cp, self.ca]
    }

    pub fn pp(&self) -> f32 { self.pp }
    pub fn pa(&self) -> f32 { self.pa }
    pub fn ap(&self) -> f32 { self.ap }
    pub fn aa(&self) -> f32 { self.aa }
    pub fn cp(&self) -> f32 { self.cp }
    pub fn ca(&self) -> f32 { self.ca }

    /// Distance of free-space propagation after which rays leaving a common
    /// point are brought back together.
    pub fn focused_distance(&self) -> Lengthf32 { -self.pa / self.aa }
}

impl Default for Affine1D {
    fn default() -> Self { Self::identity() }
}

impl Mul for Affine1D {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self { self.compose(&rhs) }
}

impl fmt::Display for Affine1D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Affine1D {{pp: {}, pa: {}, ap: {}, aa: {}, cp: {}, ca: {}}}",
               self.pp, self.pa, self.ap, self.aa, self.cp, self.ca)
    }
}
