//! Sampling of ray directions through a shared root plane.
//!
//! Every view of a light field is parametrized by the position of a ray on
//! its own plane, together with where (or at which angle) that ray crosses
//! the *root* plane. The root-plane coordinates are sampled at the points of
//! an [`AngularPlane`], which is shared between all views of one light field.

use std::fmt;
use std::str::FromStr;

use itertools::iproduct;

use crate::error::{ConstructionError, Error, Result};
use crate::plane::PlaneGeometry;
use crate::types::{Index1_u, Lengthf32, Weightf32};

/// Basis function associated with each angular sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Basis {
    /// A sample contributes only at its exact root-plane coordinates
    Point,
    /// A sample covers a `du × dv` rectangle around its coordinates
    Footprint,
}

/// Meaning of the root-plane coordinates of the samples
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Position where the ray crosses the root plane
    Spatial,
    /// Angle of the ray at the root plane
    Angular,
}

// ----- Canonical encodings --------------------------------------------------------
impl From<Basis> for u32 {
    fn from(basis: Basis) -> u32 {
        match basis { Basis::Point => 0, Basis::Footprint => 1 }
    }
}

impl TryFrom<u32> for Basis {
    type Error = Error;
    fn try_from(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Basis::Point),
            1 => Ok(Basis::Footprint),
            _ => Err(Error::Domain { kind: "angular basis", value: code.to_string() }),
        }
    }
}

impl From<Mode> for u32 {
    fn from(mode: Mode) -> u32 {
        match mode { Mode::Spatial => 0, Mode::Angular => 1 }
    }
}

impl TryFrom<u32> for Mode {
    type Error = Error;
    fn try_from(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Mode::Spatial),
            1 => Ok(Mode::Angular),
            _ => Err(Error::Domain { kind: "angular mode", value: code.to_string() }),
        }
    }
}

impl FromStr for Basis {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "point"     | "dirac"            => Ok(Basis::Point),
            "footprint" | "box" | "pillbox"  => Ok(Basis::Footprint),
            _ => Err(Error::Domain { kind: "angular basis", value: s.into() }),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spatial" | "space" => Ok(Mode::Spatial),
            "angular" | "angle" => Ok(Mode::Angular),
            _ => Err(Error::Domain { kind: "angular mode", value: s.into() }),
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Basis::Point => "point", Basis::Footprint => "footprint" })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Mode::Spatial => "spatial", Mode::Angular => "angular" })
    }
}

// ----- AngularPlane ---------------------------------------------------------------
#[derive(Clone, Debug, PartialEq)]
pub struct AngularPlane {
    du: Lengthf32,
    dv: Lengthf32,
    basis: Basis,
    mode: Mode,
    u: Vec<Lengthf32>,
    v: Vec<Lengthf32>,
    w: Vec<Weightf32>,
}

impl AngularPlane {

    pub fn new(
        (du, dv): (Lengthf32, Lengthf32),
        basis: Basis,
        mode: Mode,
        u_points: Vec<Lengthf32>,
        v_points: Vec<Lengthf32>,
        w_points: Vec<Weightf32>,
    ) -> Result<Self, ConstructionError> {
        let (nu, nv, nw) = (u_points.len(), v_points.len(), w_points.len());
        if nu != nv || nu != nw {
            return Err(ConstructionError::MismatchedLengths { u: nu, v: nv, w: nw });
        }
        for (what, value) in [("angular pitch du", du), ("angular pitch dv", dv)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConstructionError::InvalidPitch { what, value });
            }
        }
        let non_finite = (0..nu).find(|&k| !(u_points[k].is_finite() &&
                                              v_points[k].is_finite() &&
                                              w_points[k].is_finite()));
        if let Some(index) = non_finite {
            return Err(ConstructionError::NonFinite { index });
        }
        Ok(Self { du, dv, basis, mode, u: u_points, v: v_points, w: w_points })
    }

    /// One unit-weight sample at the centre of every pixel of `geometry`,
    /// with the pixel pitch as sample pitch.
    pub fn from_plane_geometry(geometry: &PlaneGeometry, basis: Basis, mode: Mode) -> Result<Self, ConstructionError> {
        Self::from_aperture(geometry, basis, mode, |_, _| 1.0)
    }

    /// Samples at the pixel centres of `geometry` through which `transmission`
    /// lets some light pass. `transmission` receives the `(min, max)` bounds
    /// of each pixel along `s` and `t`, and its result becomes the weight of
    /// the sample.
    pub fn from_aperture<F>(geometry: &PlaneGeometry, basis: Basis, mode: Mode, transmission: F) -> Result<Self, ConstructionError>
    where
        F: Fn((Lengthf32, Lengthf32), (Lengthf32, Lengthf32)) -> Weightf32,
    {
        let (mut u, mut v, mut w) = (vec![], vec![], vec![]);
        for (j, i) in iproduct!(0..geometry.nt(), 0..geometry.ns()) {
            let (s_bounds, t_bounds) = geometry.pixel_bounds(i, j);
            let wk = transmission(s_bounds, t_bounds);
            if wk > 0.0 {
                let (uk, vk) = geometry.pixel_center(i, j);
                u.push(uk);
                v.push(vk);
                w.push(wk);
            }
        }
        Self::new((geometry.ds(), geometry.dt()), basis, mode, u, v, w)
    }

    pub fn du(&self) -> Lengthf32 { self.du }
    pub fn dv(&self) -> Lengthf32 { self.dv }
    pub fn basis(&self) -> Basis { self.basis }
    pub fn mode(&self) -> Mode { self.mode }
    pub fn u_points(&self) -> &[Lengthf32] { &self.u }
    pub fn v_points(&self) -> &[Lengthf32] { &self.v }
    pub fn w_points(&self) -> &[Weightf32] { &self.w }

    pub fn num_points(&self) -> usize { self.u.len() }

    /// `(u, v, w)` of sample `k`
    pub fn point(&self, k: Index1_u) -> Result<(Lengthf32, Lengthf32, Weightf32)> {
        self.check_index(k)?;
        Ok((self.u[k], self.v[k], self.w[k]))
    }

    pub fn check_index(&self, k: Index1_u) -> Result<()> {
        if k >= self.num_points() {
            return Err(Error::IndexOutOfRange { index: k, num_points: self.num_points() });
        }
        Ok(())
    }

    /// Partition the sample indices into `num_subsets` interleaved subsets,
    /// for ordered-subset iterations: subset `i` holds `i, i + n, i + 2n, ...`
    pub fn subsets_strided(&self, num_subsets: usize) -> Result<Vec<Vec<Index1_u>>> {
        if num_subsets == 0 { return Err(ConstructionError::NoSubsets.into()) }
        Ok((0..num_subsets)
           .map(|first| (first..self.num_points()).step_by(num_subsets).collect())
           .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};
    use rstest::rstest;

    fn plane(n: usize) -> AngularPlane {
        let u = (0..n).map(|k| k as f32).collect();
        let v = vec![0.0; n];
        let w = vec![1.0; n];
        AngularPlane::new((1.0, 1.0), Basis::Point, Mode::Spatial, u, v, w).unwrap()
    }

    #[rstest(/**/ nu, nv, nw,
             case(3 , 2 , 3 ),
             case(3 , 3 , 4 ),
             case(0 , 1 , 0 ),
    )]
    fn mismatched_lengths_are_rejected(nu: usize, nv: usize, nw: usize) {
        let err = AngularPlane::new((1.0, 1.0), Basis::Footprint, Mode::Angular,
                                    vec![0.0; nu], vec![0.0; nv], vec![1.0; nw]).unwrap_err();
        assert_eq!(err, ConstructionError::MismatchedLengths { u: nu, v: nv, w: nw });
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let err = AngularPlane::new((1.0, 1.0), Basis::Point, Mode::Spatial,
                                    vec![0.0, 1.0], vec![0.0, f32::NAN], vec![1.0, 1.0]).unwrap_err();
        assert_eq!(err, ConstructionError::NonFinite { index: 1 });
        let err = AngularPlane::new((0.0, 1.0), Basis::Point, Mode::Spatial,
                                    vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidPitch { .. }));
    }

    #[rstest(/**/ text       , expected        ,
             case("point"    , Basis::Point    ),
             case("Dirac"    , Basis::Point    ),
             case("footprint", Basis::Footprint),
             case("pillbox"  , Basis::Footprint),
    )]
    fn basis_from_str(text: &str, expected: Basis) {
        assert_eq!(text.parse::<Basis>(), Ok(expected));
    }

    #[test]
    fn unknown_enumerators_are_domain_errors() {
        assert_eq!("gaussian".parse::<Basis>(),
                   Err(Error::Domain { kind: "angular basis", value: "gaussian".into() }));
        assert_eq!(Mode::try_from(2_u32),
                   Err(Error::Domain { kind: "angular mode", value: "2".into() }));
        assert!("sideways".parse::<Mode>().is_err());
    }

    #[test]
    fn canonical_encoding() {
        for basis in [Basis::Point, Basis::Footprint] {
            assert_eq!(Basis::try_from(u32::from(basis)), Ok(basis));
        }
        for mode in [Mode::Spatial, Mode::Angular] {
            assert_eq!(Mode::try_from(u32::from(mode)), Ok(mode));
        }
        assert_eq!(u32::from(Basis::Footprint), 1);
        assert_eq!(u32::from(Mode::Spatial), 0);
    }

    #[rstest(/**/ n, subsets, expected,
             case(7, 3, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]),
             case(2, 3, vec![vec![0], vec![1], vec![]]),
             case(4, 1, vec![vec![0, 1, 2, 3]]),
    )]
    fn strided_subsets(n: usize, subsets: usize, expected: Vec<Vec<usize>>) {
        assert_eq!(plane(n).subsets_strided(subsets), Ok(expected));
    }

    #[test]
    fn zero_subsets() {
        assert_eq!(plane(3).subsets_strided(0), Err(Error::Construction(ConstructionError::NoSubsets)));
    }

    #[test]
    fn samples_from_plane_geometry() {
        let geometry = PlaneGeometry::centred((3, 2), (0.5, 2.0)).unwrap();
        let angular = AngularPlane::from_plane_geometry(&geometry, Basis::Footprint, Mode::Angular).unwrap();
        assert_eq!(angular.num_points(), 6);
        assert_eq!((angular.du(), angular.dv()), (0.5, 2.0));
        assert_eq!(angular.u_points(), &[-0.5, 0.0, 0.5, -0.5, 0.0, 0.5]);
        assert_eq!(angular.v_points(), &[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
        assert_eq!(angular.point(4), Ok((0.0, 1.0, 1.0)));
        assert_eq!(angular.point(6), Err(Error::IndexOutOfRange { index: 6, num_points: 6 }));
    }

    #[test]
    fn samples_from_circular_aperture() {
        let geometry = PlaneGeometry::centred((5, 5), (1.0, 1.0)).unwrap();
        let circle = |(s0, s1): (f32, f32), (t0, t1): (f32, f32)| {
            let (s, t) = ((s0 + s1) / 2.0, (t0 + t1) / 2.0);
            if s * s + t * t <= 2.0 * 2.0 { 0.5 } else { 0.0 }
        };
        let angular = AngularPlane::from_aperture(&geometry, Basis::Point, Mode::Spatial, circle).unwrap();
        // 5x5 grid minus the 4 corners, and the 8 pixels at distance sqrt(5)
        assert_eq!(angular.num_points(), 13);
        assert!(angular.w_points().iter().all(|&w| w == 0.5));
    }
}
