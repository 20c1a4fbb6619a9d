//! Forward and backward projection of light-field views between two planes.
//!
//! The `TransportOperator` connects a *source* view to a *destination* view of
//! the same light field. Both views are parametrized through a shared
//! `AngularPlane`, so an angular sample `k` denotes the same bundle of rays on
//! both planes: the forward projection resamples the source radiance of that
//! bundle onto the destination pixels, and the backward projection is its
//! exact adjoint.
//!
//! The operator is separable. For each call the two 1D resampling matrices
//! (see `system_matrix`) are built for the requested sample, and applied
//! along `t` first and `s` second, through an intermediate of shape
//! `(ns_src, nt_dst)`.

pub struct TransportOperator {
    angular: Arc<AngularPlane>,
    src: LightFieldGeometry,
    dst: LightFieldGeometry,
    src_to_dst: Optics2D,
    dst_to_src: Optics2D,
    /// Source position as a function of destination position and root
    /// coordinate, indexed by axis
    maps: [RayMap; 2],
    scale: Weightf32,
}

impl TransportOperator {

    pub fn new(src: LightFieldGeometry, dst: LightFieldGeometry, angular: Arc<AngularPlane>) -> Result<Self> {
        let non_invertible = |chain| move |source| ConstructionError::NonInvertible { chain, source };
        src.optics_to_root.invert().map_err(non_invertible(Chain::SourceToRoot))?;
        let dst_root_to_plane = dst.optics_to_root.invert().map_err(non_invertible(Chain::DestinationToRoot))?;

        // A chain followed by its own inverse is exactly the identity, which
        // rounding in the composition would otherwise blur
        let src_to_dst = if src.optics_to_root == dst.optics_to_root { Optics2D::identity() }
                         else { dst_root_to_plane.compose(&src.optics_to_root) };
        let dst_to_src = src_to_dst.invert().map_err(non_invertible(Chain::SourceToDestination))?;

        let map = |axis| RayMap::new(dst_to_src.axis(axis), dst.optics_to_root.axis(axis), angular.mode())
            .ok_or(ConstructionError::DegenerateParametrization { axis });
        let maps = [map(Axis::X)?, map(Axis::Y)?];

        debug!(%src_to_dst, %dst_to_src, ?maps, basis = %angular.basis(), mode = %angular.mode(),
               "transport operator constructed");
        Ok(Self { angular, src, dst, src_to_dst, dst_to_src, maps, scale: 1.0 })
    }

    /// Multiply every projection by `scale`
    pub fn with_scale(mut self, scale: Weightf32) -> Self {
        self.scale = scale;
        self
    }

    pub fn source     (&self) -> &LightFieldGeometry { &self.src }
    pub fn destination(&self) -> &LightFieldGeometry { &self.dst }
    pub fn angular_plane(&self) -> &Arc<AngularPlane> { &self.angular }
    pub fn src_to_dst(&self) -> &Optics2D { &self.src_to_dst }
    pub fn dst_to_src(&self) -> &Optics2D { &self.dst_to_src }
    pub fn scale(&self) -> Weightf32 { self.scale }
    pub fn num_views(&self) -> usize { self.angular.num_points() }

    /// The two 1D resampling matrices of angular sample `k`, and the weight
    /// applied on top of them. Built on the backend's thread pool.
    pub fn system_matrices(&self, k: Index1_u) -> Result<(AxisMatrix, AxisMatrix, Weightf32)> {
        let backend = backend::get()?;
        let (u, v, w) = self.angular.point(k)?;
        let basis = self.angular.basis();
        let (src, dst) = (&self.src.plane, &self.dst.plane);
        let (sx, sy) = backend.install(|| (
            AxisMatrix::new(basis, &self.maps[0], u, self.angular.du(), dst.axis(Axis::X), src.axis(Axis::X)),
            AxisMatrix::new(basis, &self.maps[1], v, self.angular.dv(), dst.axis(Axis::Y), src.axis(Axis::Y)),
        ));
        Ok((sx, sy, w * self.scale))
    }

    // ----- Forward projection -------------------------------------------------------

    /// Resample angular view `k` of the source plane onto the destination plane
    pub fn forward(&self, src_view: ArrayView2<Intensityf32>, k: Index1_u) -> Result<View> {
        let mut dst_view = self.dst.plane.zeros();
        self.forward_accumulate(src_view, k, dst_view.view_mut())?;
        Ok(dst_view)
    }

    /// Like `forward`, but add the projection into `dst_view`
    pub fn forward_accumulate(
        &self,
        src_view: ArrayView2<Intensityf32>,
        k: Index1_u,
        mut dst_view: ArrayViewMut2<Intensityf32>,
    ) -> Result<()> {
        self.src.plane.check_shape(&src_view)?;
        self.dst.plane.check_shape(&dst_view)?;
        let backend = backend::get()?;
        let (sx, sy, weight) = self.system_matrices(k)?;
        let _span = trace_span!("forward", k, weight).entered();

        let (ns_src, nt_dst) = (self.src.plane.ns(), self.dst.plane.nt());
        backend.install(|| {
            // Gather along t: every intermediate column is a weighted sum of
            // source columns
            let mut partial: View = Array2::zeros((ns_src, nt_dst).f());
            partial.axis_iter_mut(ndarray::Axis(1))
                .into_par_iter()
                .zip(sy.rows().par_iter())
                .for_each(|(mut column, row)| {
                    for (l, w) in row { column.scaled_add(w, &src_view.column(l)) }
                });
            // Gather along s
            dst_view.axis_iter_mut(ndarray::Axis(0))
                .into_par_iter()
                .zip(sx.rows().par_iter())
                .for_each(|(mut dst_row, row)| {
                    for (j, w) in row { dst_row.scaled_add(weight * w, &partial.row(j)) }
                });
        });
        Ok(())
    }

    // ----- Backward projection ------------------------------------------------------

    /// Adjoint of `forward`: spread angular view `k` of the destination plane
    /// back onto the source plane
    pub fn backward(&self, dst_view: ArrayView2<Intensityf32>, k: Index1_u) -> Result<View> {
        let mut src_view = self.src.plane.zeros();
        self.backward_accumulate(dst_view, k, src_view.view_mut())?;
        Ok(src_view)
    }

    /// Like `backward`, but add the projection into `src_view`
    pub fn backward_accumulate(
        &self,
        dst_view: ArrayView2<Intensityf32>,
        k: Index1_u,
        mut src_view: ArrayViewMut2<Intensityf32>,
    ) -> Result<()> {
        self.dst.plane.check_shape(&dst_view)?;
        self.src.plane.check_shape(&src_view)?;
        let backend = backend::get()?;
        let (sx, sy, weight) = self.system_matrices(k)?;
        let _span = trace_span!("backward", k, weight).entered();

        let (ns_src, nt_src) = self.src.plane.shape();
        let (ns_dst, nt_dst) = self.dst.plane.shape();
        let (s_jobs, t_jobs) = (backend.job_size(ns_dst), backend.job_size(nt_dst));
        backend.install(|| {
            // Scatter along s: each destination row spreads into several
            // intermediate rows, so every job accumulates into its own buffer
            let partial = sx.rows()
                .par_iter()
                .zip(dst_view.axis_iter(ndarray::Axis(0)))
                .fold_chunks(s_jobs,
                             || zeros((ns_src, nt_dst)),
                             |mut acc, (row, values)| {
                                 for (j, w) in row { acc.row_mut(j).scaled_add(w, &values) }
                                 acc
                             })
                .reduce(|| zeros((ns_src, nt_dst)), elementwise_add);
            // Scatter along t
            let backprojection = sy.rows()
                .par_iter()
                .zip(partial.axis_iter(ndarray::Axis(1)))
                .fold_chunks(t_jobs,
                             || zeros((ns_src, nt_src)),
                             |mut acc, (row, values)| {
                                 for (l, w) in row { acc.column_mut(l).scaled_add(w, &values) }
                                 acc
                             })
                .reduce(|| zeros((ns_src, nt_src)), elementwise_add);
            src_view.scaled_add(weight, &backprojection);
        });
        Ok(())
    }
}

fn zeros(shape: (usize, usize)) -> View { Array2::zeros(shape.f()) }

fn elementwise_add(mut a: View, b: View) -> View {
    a += &b;
    a
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::sync::Arc;

use ndarray::{Array2, ArrayView2, ArrayViewMut2, ShapeBuilder};
use ndarray::parallel::prelude::*;
use tracing::{debug, trace_span};

use optics::{Axis, Optics2D};

use crate::angular::AngularPlane;
use crate::backend;
use crate::error::{Chain, ConstructionError, Result};
use crate::light_field::LightFieldGeometry;
use crate::system_matrix::{AxisMatrix, RayMap};
use crate::types::{Index1_u, Intensityf32, View, Weightf32};

// ------------------------------ TESTS ------------------------------
#[cfg(test)]
mod test {
    use super::*;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};
    use float_eq::assert_float_eq;
    use rstest::rstest;

    use optics::{Affine1D, OpticsError};

    use crate::angular::{Basis, Mode};
    use crate::error::Error;
    use crate::plane::PlaneGeometry;

    fn unit_samples(basis: Basis, mode: Mode, pitch: f32) -> Arc<AngularPlane> {
        let grid = PlaneGeometry::centred((3, 3), (pitch, pitch)).unwrap();
        Arc::new(AngularPlane::from_plane_geometry(&grid, basis, mode).unwrap())
    }

    fn view(n: (usize, usize), pitch: (f32, f32), optics: Optics2D) -> LightFieldGeometry {
        LightFieldGeometry::new(PlaneGeometry::new(n, pitch, (0.3, -0.2)).unwrap(), optics)
    }

    fn ramp(plane: &PlaneGeometry) -> View {
        let (ns, nt) = plane.shape();
        plane.from_column_major((0..ns * nt).map(|i| 1.0 + i as f32).collect()).unwrap()
    }

    fn lens_chain() -> Optics2D {
        Optics2D::translation(30.0).then(&Optics2D::refraction_xy(50.0, 1.0, 40.0, -2.0).unwrap())
    }

    #[rstest(/**/ optics                       ,
             case(Optics2D::identity()         ),
             case(Optics2D::translation(40.0)  ),
             case(Optics2D::translation(-7.5)  ),
             case(lens_chain()                 ),
             case(Optics2D::translation(1000.0).then(&lens_chain())),
    )]
    fn identical_views_reproduce_input(optics: Optics2D) {
        backend::simple_init().unwrap();
        // Small planes, and long ones whose far pixels sit where f32
        // positions have little precision left
        for (n, pitch) in [((   7, 5), (0.5  , 0.4)),
                           ((3001, 2), (0.1  , 0.4)),
                           ((4096, 2), (0.013, 0.4)),
                           ((8192, 2), (0.005, 0.4))] {
            let same = view(n, pitch, optics);
            let input = ramp(&same.plane);
            for basis in [Basis::Point, Basis::Footprint] {
                for mode in [Mode::Spatial, Mode::Angular] {
                    let angular = unit_samples(basis, mode, 0.2);
                    let transport = TransportOperator::new(same, same, angular).unwrap();
                    for k in 0..transport.num_views() {
                        assert_eq!(transport.forward (input.view(), k).unwrap(), input, "{n:?} {basis} {mode} k = {k}");
                        assert_eq!(transport.backward(input.view(), k).unwrap(), input, "{n:?} {basis} {mode} k = {k}");
                    }
                }
            }
        }
    }

    #[test]
    fn identical_chains_give_exact_identity() {
        let lens = Optics2D::translation(1000.0).then(&Optics2D::refraction_xy(50.0, 1.0, 40.0, -2.0).unwrap());
        let same = view((4, 4), (1.0, 1.0), lens);
        let transport = TransportOperator::new(same, same, unit_samples(Basis::Point, Mode::Spatial, 1.0)).unwrap();
        assert_eq!(*transport.src_to_dst(), Optics2D::identity());
        assert_eq!(*transport.dst_to_src(), Optics2D::identity());
    }

    #[test]
    fn src_to_dst_and_dst_to_src_are_inverses() {
        let src = view((4, 4), (1.0, 1.0), Optics2D::translation(40.0));
        let dst = view((4, 4), (1.0, 1.0), lens_chain());
        let transport = TransportOperator::new(src, dst, unit_samples(Basis::Point, Mode::Spatial, 1.0)).unwrap();
        let roundtrip = transport.src_to_dst().then(transport.dst_to_src());
        for axis in Axis::BOTH {
            assert_float_eq!(roundtrip.axis(axis).coefficients(),
                             Affine1D::identity().coefficients(),
                             abs_all <= 1e-4);
        }
    }

    #[test]
    fn shifted_copy_between_parallel_planes() {
        backend::simple_init().unwrap();
        // Rays at angle 0.5 (x) / 0 (y) travel 4 further to reach the
        // destination: a shift of 2 along s, which is 2 pixels of pitch 1
        let src = LightFieldGeometry::new(PlaneGeometry::centred((6, 3), (1.0, 1.0)).unwrap(), Optics2D::translation(10.0));
        let dst = LightFieldGeometry::new(PlaneGeometry::centred((6, 3), (1.0, 1.0)).unwrap(), Optics2D::translation(6.0));
        let angular = AngularPlane::new((0.1, 0.1), Basis::Point, Mode::Angular, vec![0.5], vec![0.0], vec![1.0]).unwrap();
        let transport = TransportOperator::new(src, dst, Arc::new(angular)).unwrap();
        let input = ramp(&src.plane);
        let output = transport.forward(input.view(), 0).unwrap();
        for j in 0..3 {
            for i in 0..6 {
                let expected = if i >= 2 { input[[i - 2, j]] } else { 0.0 };
                assert_float_eq!(output[[i, j]], expected, abs <= 1e-4);
            }
        }
    }

    #[test]
    fn scale_and_sample_weight_multiply_projections() {
        backend::simple_init().unwrap();
        let same = view((5, 4), (1.0, 1.0), Optics2D::translation(20.0));
        let angular = AngularPlane::new((1.0, 1.0), Basis::Footprint, Mode::Spatial,
                                        vec![0.0], vec![0.0], vec![0.5]).unwrap();
        let transport = TransportOperator::new(same, same, Arc::new(angular)).unwrap().with_scale(3.0);
        let input = ramp(&same.plane);
        assert_eq!(transport.forward(input.view(), 0).unwrap(), &input * 1.5);
        assert_eq!(transport.backward(input.view(), 0).unwrap(), &input * 1.5);
    }

    #[test]
    fn accumulation_adds_to_existing_contents() {
        backend::simple_init().unwrap();
        let same = view((5, 4), (1.0, 1.0), Optics2D::translation(20.0));
        let transport = TransportOperator::new(same, same, unit_samples(Basis::Point, Mode::Spatial, 1.0)).unwrap();
        let input = ramp(&same.plane);
        let mut accumulator = same.plane.ones();
        transport.forward_accumulate(input.view(), 4, accumulator.view_mut()).unwrap();
        transport.forward_accumulate(input.view(), 4, accumulator.view_mut()).unwrap();
        assert_eq!(accumulator, &input * 2.0 + 1.0);
    }

    #[test]
    fn wrong_shapes_and_indices_are_rejected_before_touching_output() {
        backend::simple_init().unwrap();
        let src = view((5, 4), (1.0, 1.0), Optics2D::translation(20.0));
        let dst = view((6, 3), (1.0, 1.0), Optics2D::translation(25.0));
        let transport = TransportOperator::new(src, dst, unit_samples(Basis::Point, Mode::Spatial, 1.0)).unwrap();

        let wrong = Array2::<f32>::ones((4, 5));
        assert_eq!(transport.forward(wrong.view(), 0),
                   Err(Error::ShapeMismatch { expected: (5, 4), found: (4, 5) }));
        assert_eq!(transport.backward(wrong.view(), 0),
                   Err(Error::ShapeMismatch { expected: (6, 3), found: (4, 5) }));
        assert_eq!(transport.forward(src.plane.ones().view(), 9),
                   Err(Error::IndexOutOfRange { index: 9, num_points: 9 }));

        let mut untouched = dst.plane.ones();
        let result = transport.forward_accumulate(src.plane.ones().view(), 9, untouched.view_mut());
        assert!(result.is_err());
        assert_eq!(untouched, dst.plane.ones());
    }

    #[test]
    fn non_invertible_optics_are_reported() {
        let singular = Affine1D::from_coefficients(1.0, 2.0, 0.5, 1.0, 0.0, 0.0);
        let bad = view((3, 3), (1.0, 1.0), Optics2D::new(Affine1D::identity(), singular));
        let good = view((3, 3), (1.0, 1.0), Optics2D::translation(5.0));
        let angular = unit_samples(Basis::Point, Mode::Angular, 1.0);

        let err = TransportOperator::new(good, bad, angular.clone()).err();
        let expected_source = OpticsError::NonInvertible { determinant: 0.0 }.on_axis(Axis::Y);
        assert_eq!(err, Some(Error::Construction(ConstructionError::NonInvertible {
            chain: Chain::DestinationToRoot, source: expected_source.clone() })));

        let err = TransportOperator::new(bad, good, angular).err();
        assert_eq!(err, Some(Error::Construction(ConstructionError::NonInvertible {
            chain: Chain::SourceToRoot, source: expected_source })));
    }

    #[test]
    fn degenerate_parametrization_is_reported() {
        // Spatial samples on a destination plane which *is* the root plane
        let src = view((3, 3), (1.0, 1.0), Optics2D::translation(10.0));
        let dst = view((3, 3), (1.0, 1.0), Optics2D::identity());
        let err = TransportOperator::new(src, dst, unit_samples(Basis::Footprint, Mode::Spatial, 1.0)).err();
        assert_eq!(err, Some(Error::Construction(ConstructionError::DegenerateParametrization { axis: Axis::X })));
        // ... but angular samples determine the rays
        assert!(TransportOperator::new(src, dst, unit_samples(Basis::Footprint, Mode::Angular, 1.0)).is_ok());
    }
}
