//! Calculation of the resampling weights which connect the pixels of two
//! views of a light field, for one angular sample.
//!
//! The optics between two views never couple the `x` and `y` axes, so the 2D
//! resampling operator is the product of two 1D operators. Each 1D operator
//! is a sparse matrix with one row per destination pixel: the row lists the
//! source pixels seen by the destination pixel, and the fraction of the
//! destination lixel which lands in each of them.
//!
//! Forward and backward projections both read the same rows, which makes
//! the backward projection the exact transpose of the forward one.

// ----- The trait --------------------------------------------------------------------

/// Interface for the 1D density obtained by mapping one destination lixel onto
/// the source plane, in the source plane's edge-index coordinates (pixel `j`
/// covers `[j, j+1)`). The density has unit mass.
pub trait Kernel: Sized {
    /// Density centred on `centre`, resulting from a destination pixel which
    /// maps onto `width` source pixels, smeared by an angular footprint which
    /// maps onto `footprint` source pixels.
    fn new(centre: f64, width: f64, footprint: f64) -> Self;

    /// Smallest interval containing all the mass
    fn support(&self) -> (f64, f64);

    /// Mass below `x`
    fn cdf(&self, x: f64) -> f64;

    /// Place the mass falling into each of the `n` source pixels into
    /// `system_matrix_row`. Mass outside the plane is lost.
    fn update_system_matrix_row(&self, system_matrix_row: &mut SystemMatrixRow, n: usize) {
        system_matrix_row.clear();
        let (lo, hi) = self.support();
        if !(lo < n as f64 && hi >= 0.0) { return }
        let first = lo.floor().max(0.0) as usize;
        let last  = (hi.floor() as usize).saturating_add(1).min(n);
        let mut below = self.cdf(first as f64);
        for j in first..last {
            let above = self.cdf((j + 1) as f64);
            let weight = (above - below) as Weightf32;
            if weight > 0.0 { system_matrix_row.0.push((j, weight)) }
            below = above;
        }
    }
}

// ----- Implementations of the trait -----------------------------------------------
pub mod spline;
pub use spline::{Rect, Trapezoid};

// ----- Storage of system matrix elements ------------------------------------------
pub type SystemMatrixElement = Index1Weightf32;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemMatrixRow(pub Vec<SystemMatrixElement>);

impl SystemMatrixRow {
    pub fn iter(&self) -> std::slice::Iter<SystemMatrixElement> { self.0.iter() }
    pub fn clear(&mut self) { self.0.clear(); }
    pub fn total_weight(&self) -> Weightf32 { self.0.iter().map(|(_, w)| w).sum() }
}

impl IntoIterator for SystemMatrixRow {
    type Item = SystemMatrixElement;
    type IntoIter = std::vec::IntoIter<Self::Item>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SystemMatrixRow {
    type Item = SystemMatrixElement;
    type IntoIter = std::iter::Cloned<std::slice::Iter<'a, Self::Item>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().cloned()
    }
}

// ----- Ray map --------------------------------------------------------------------

/// Where a ray lands on the source plane, given its position `s` on the
/// destination plane and its sampled root-plane coordinate `u`:
///
/// `s_src = alpha * s + gamma * u + beta`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayMap {
    pub alpha: f32,
    pub gamma: f32,
    pub beta: Lengthf32,
}

impl RayMap {
    /// Eliminate the ray angle on the destination plane, using the relation
    /// between the destination plane and the root plane selected by `mode`.
    ///
    /// Returns `None` if that relation does not involve the ray angle, while
    /// the source position does depend on it.
    pub fn new(dst_to_src: &Affine1D, dst_to_root: &Affine1D, mode: Mode) -> Option<Self> {
        let t = dst_to_src;
        if t.pa() == 0.0 {
            return Some(Self { alpha: t.pp(), gamma: 0.0, beta: t.cp() });
        }
        // u = along_position * s + along_angle * a + offset
        let (along_position, along_angle, offset) = match mode {
            Mode::Spatial => (dst_to_root.pp(), dst_to_root.pa(), dst_to_root.cp()),
            Mode::Angular => (dst_to_root.ap(), dst_to_root.aa(), dst_to_root.ca()),
        };
        if along_angle == 0.0 || !along_angle.is_finite() { return None }
        let slope = t.pa() / along_angle;
        Some(Self {
            alpha: t.pp() - slope * along_position,
            gamma: slope,
            beta:  t.cp() - slope * offset,
        })
    }

    #[inline]
    pub fn position(&self, s: Lengthf32, u: Lengthf32) -> Lengthf32 {
        self.alpha * s + self.gamma * u + self.beta
    }
}

// ----- One axis of the resampling operator ----------------------------------------

/// Sparse 1D resampling matrix: one row per destination pixel, indexing
/// source pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisMatrix {
    rows: Vec<SystemMatrixRow>,
    n_src: usize,
}

impl AxisMatrix {

    /// Rows for angular sample at root coordinate `u` with pitch `du`.
    pub fn new(basis: Basis, map: &RayMap, u: Lengthf32, du: Lengthf32, dst: PlaneAxis, src: PlaneAxis) -> Self {
        match basis {
            Basis::Point     => Self::with_kernel::<Rect>     (map, u, 0.0, dst, src),
            Basis::Footprint => Self::with_kernel::<Trapezoid>(map, u, du , dst, src),
        }
    }

    fn with_kernel<K: Kernel>(map: &RayMap, u: Lengthf32, du: Lengthf32, dst: PlaneAxis, src: PlaneAxis) -> Self {
        // Work in source edge-index coordinates throughout: converting
        // positions on large planes to and from lengths loses more than the
        // snapping tolerance of the kernels.
        let (d_dst, d_src) = (dst.pitch as f64, src.pitch as f64);
        let magnification = map.alpha as f64 * d_dst / d_src;
        let shift = (map.gamma as f64 * u as f64 + map.beta as f64) / d_src + src.w() as f64 + 0.5;
        let w_dst = dst.w() as f64;
        let width     = magnification.abs();
        let footprint = (map.gamma as f64 * du as f64 / d_src).abs();
        let rows = (0..dst.n)
            .into_par_iter()
            .map(|i| {
                let centre = magnification * (i as f64 - w_dst) + shift;
                let mut row = SystemMatrixRow::default();
                K::new(centre, width, footprint).update_system_matrix_row(&mut row, src.n);
                row
            })
            .collect();
        Self { rows, n_src: src.n }
    }

    pub fn rows(&self) -> &[SystemMatrixRow] { &self.rows }
    pub fn n_dst(&self) -> usize { self.rows.len() }
    pub fn n_src(&self) -> usize { self.n_src }

    #[cfg(test)]
    pub fn to_dense(&self) -> ndarray::Array2<Weightf32> {
        let mut dense = ndarray::Array2::zeros((self.n_dst(), self.n_src));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, w) in row { dense[[i, j]] += w; }
        }
        dense
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use rayon::prelude::*;

use optics::Affine1D;

use crate::angular::{Basis, Mode};
use crate::plane::PlaneAxis;
use crate::types::{Index1Weightf32, Lengthf32, Weightf32};
