//! Discretization of a plane into a regular grid of pixels.
//!
//! Pixel `i` along `s` is centred at `(i - ws) * ds` where
//! `ws = (ns - 1) / 2 + offset_s`: with zero offset the grid is centred on
//! the optical axis. Along `t` likewise.

use ndarray::{Array2, ArrayBase, Data, Ix2, ShapeBuilder};

use optics::Axis;

use crate::error::{ConstructionError, Error, Result};
use crate::types::{Index1_u, Intensityf32, Lengthf32, View};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneGeometry {
    ns: usize,
    nt: usize,
    ds: Lengthf32,
    dt: Lengthf32,
    offset_s: f32,
    offset_t: f32,
}

impl PlaneGeometry {

    pub fn new(
        (ns, nt): (usize, usize),
        (ds, dt): (Lengthf32, Lengthf32),
        (offset_s, offset_t): (f32, f32),
    ) -> Result<Self, ConstructionError> {
        if ns == 0 || nt == 0 { return Err(ConstructionError::EmptyPlane { ns, nt }) }
        check_pitch("pixel pitch ds", ds)?;
        check_pitch("pixel pitch dt", dt)?;
        if !offset_s.is_finite() { return Err(ConstructionError::InvalidPitch { what: "offset_s", value: offset_s }) }
        if !offset_t.is_finite() { return Err(ConstructionError::InvalidPitch { what: "offset_t", value: offset_t }) }
        Ok(Self { ns, nt, ds, dt, offset_s, offset_t })
    }

    /// Grid centred on the optical axis
    pub fn centred(n: (usize, usize), pitch: (Lengthf32, Lengthf32)) -> Result<Self, ConstructionError> {
        Self::new(n, pitch, (0.0, 0.0))
    }

    pub fn ns(&self) -> usize { self.ns }
    pub fn nt(&self) -> usize { self.nt }
    pub fn ds(&self) -> Lengthf32 { self.ds }
    pub fn dt(&self) -> Lengthf32 { self.dt }
    pub fn offset_s(&self) -> f32 { self.offset_s }
    pub fn offset_t(&self) -> f32 { self.offset_t }

    pub fn shape(&self) -> (usize, usize) { (self.ns, self.nt) }
    pub fn num_pixels(&self) -> usize { self.ns * self.nt }
    pub fn pixel_area(&self) -> f32 { self.ds * self.dt }

    pub fn ws(&self) -> f32 { self.axis(Axis::X).w() }
    pub fn wt(&self) -> f32 { self.axis(Axis::Y).w() }

    /// Position of the centre of the pixel with index `i` along `s`
    pub fn is2s(&self, i: Index1_u) -> Lengthf32 { self.axis(Axis::X).centre(i) }
    pub fn it2t(&self, j: Index1_u) -> Lengthf32 { self.axis(Axis::Y).centre(j) }

    /// Continuous index of position `s`, in which pixel `i` covers `[i, i+1)`
    pub fn s2is(&self, s: Lengthf32) -> f32 { self.axis(Axis::X).edge_index(s) }
    pub fn t2it(&self, t: Lengthf32) -> f32 { self.axis(Axis::Y).edge_index(t) }

    pub fn pixel_center(&self, i: Index1_u, j: Index1_u) -> (Lengthf32, Lengthf32) {
        (self.is2s(i), self.it2t(j))
    }

    /// `((s_min, s_max), (t_min, t_max))` of a single pixel
    pub fn pixel_bounds(&self, i: Index1_u, j: Index1_u) -> ((Lengthf32, Lengthf32), (Lengthf32, Lengthf32)) {
        (self.axis(Axis::X).bounds(i), self.axis(Axis::Y).bounds(j))
    }

    /// `((s_min, s_max), (t_min, t_max))` of the whole plane
    pub fn spatial_bounds(&self) -> ((Lengthf32, Lengthf32), (Lengthf32, Lengthf32)) {
        (self.axis(Axis::X).extent(), self.axis(Axis::Y).extent())
    }

    pub fn axis(&self, axis: Axis) -> PlaneAxis {
        match axis {
            Axis::X => PlaneAxis { n: self.ns, pitch: self.ds, offset: self.offset_s },
            Axis::Y => PlaneAxis { n: self.nt, pitch: self.dt, offset: self.offset_t },
        }
    }

    // ----- Buffers ------------------------------------------------------------------
    pub fn zeros(&self) -> View { Array2::zeros(self.shape().f()) }
    pub fn ones (&self) -> View { Array2::ones (self.shape().f()) }

    /// Wrap a column-major buffer of `ns * nt` values. A wrongly sized buffer
    /// is reported with shape `(len, 1)`.
    pub fn from_column_major(&self, data: Vec<Intensityf32>) -> Result<View> {
        let found = (data.len(), 1);
        Array2::from_shape_vec(self.shape().f(), data)
            .map_err(|_| Error::ShapeMismatch { expected: self.shape(), found })
    }

    pub fn check_shape<S: Data>(&self, view: &ArrayBase<S, Ix2>) -> Result<()> {
        let found = view.dim();
        if found != self.shape() {
            return Err(Error::ShapeMismatch { expected: self.shape(), found })
        }
        Ok(())
    }
}

fn check_pitch(what: &'static str, value: f32) -> Result<(), ConstructionError> {
    if value.is_finite() && value > 0.0 { Ok(()) }
    else { Err(ConstructionError::InvalidPitch { what, value }) }
}

/// One axis of a [`PlaneGeometry`]. Only obtainable from a validated plane,
/// so it always has at least one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneAxis {
    pub(crate) n: usize,
    pub(crate) pitch: Lengthf32,
    pub(crate) offset: f32,
}

impl PlaneAxis {
    pub fn n     (&self) -> usize     { self.n }
    pub fn pitch (&self) -> Lengthf32 { self.pitch }
    pub fn offset(&self) -> f32       { self.offset }

    /// Index of the pixel whose centre lies at the origin
    #[inline] pub fn w(&self) -> f32 { (self.n as f32 - 1.0) / 2.0 + self.offset }

    #[inline] pub fn centre(&self, i: Index1_u) -> Lengthf32 { (i as f32 - self.w()) * self.pitch }

    #[inline] pub fn edge_index(&self, x: Lengthf32) -> f32 { x / self.pitch + self.w() + 0.5 }

    pub fn bounds(&self, i: Index1_u) -> (Lengthf32, Lengthf32) {
        let c = self.centre(i);
        let half = self.pitch / 2.0;
        (c - half, c + half)
    }

    pub fn extent(&self) -> (Lengthf32, Lengthf32) {
        (self.bounds(0).0, self.bounds(self.n - 1).1)
    }
}
