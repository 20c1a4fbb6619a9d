//! A single view of a light field: a discretized plane together with the
//! optics carrying rays from that plane to the root (angular) plane.

use optics::{Affine1D, Axis, Optics2D};

use crate::angular::{AngularPlane, Basis, Mode};
use crate::plane::PlaneGeometry;
use crate::types::{Lengthf32, Weightf32};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightFieldGeometry {
    pub plane: PlaneGeometry,
    pub optics_to_root: Optics2D,
}

impl LightFieldGeometry {
    pub fn new(plane: PlaneGeometry, optics_to_root: Optics2D) -> Self {
        Self { plane, optics_to_root }
    }

    /// Squared norm of the basis function of one lixel (light-field pixel).
    ///
    /// A lixel is the product of a pixel indicator on this plane and an
    /// angular basis function on the root plane, seen through the optics to
    /// the root. Its squared norm converts between radiance and accumulated
    /// flux, e.g. when light is collected on a sensor.
    pub fn lixel_volume(&self, angular: &AngularPlane) -> Weightf32 {
        let (du, dv) = (angular.du(), angular.dv());
        let vs = lixel_extent(self.optics_to_root.axis(Axis::X), self.plane.ds(), du, angular);
        let vt = lixel_extent(self.optics_to_root.axis(Axis::Y), self.plane.dt(), dv, angular);
        vs * vt
    }
}

/// One axis' factor of `lixel_volume`
fn lixel_extent(to_root: &Affine1D, d: Lengthf32, du: Lengthf32, angular: &AngularPlane) -> f32 {
    // Coefficients relating the sampled root coordinate to (position, angle)
    // on this plane
    let (along_position, along_angle) = match angular.mode() {
        Mode::Spatial => (to_root.pp(), to_root.pa()),
        Mode::Angular => (to_root.ap(), to_root.aa()),
    };
    match angular.basis() {
        Basis::Point => (du / along_angle).abs() * d,
        Basis::Footprint => {
            let m = f32::max(du / 2.0 / along_angle.abs(),
                             d * along_position.abs() / 2.0 / along_angle.abs());
            let h = f32::min(d, du / along_position.abs());
            2.0 * m * h
        }
    }
}
