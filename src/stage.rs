//! Linear stages acting on one angular view at a time.
//!
//! A [`Stage`] maps a view on its input plane to a view on its output plane,
//! and provides the adjoint mapping back. `TransportOperator` is one; a
//! [`Mask`] (pixelwise attenuation on a single plane) is another. Stages
//! compose into pipelines with [`Then`].

pub trait Stage {
    fn input_plane (&self) -> &PlaneGeometry;
    fn output_plane(&self) -> &PlaneGeometry;

    /// Add the image of input view `k` to `output`
    fn forward_accumulate(
        &self,
        input: ArrayView2<Intensityf32>,
        k: Index1_u,
        output: ArrayViewMut2<Intensityf32>,
    ) -> Result<()>;

    /// Adjoint of `forward_accumulate`: add the back-projection of output
    /// view `k` to `input`
    fn backward_accumulate(
        &self,
        output: ArrayView2<Intensityf32>,
        k: Index1_u,
        input: ArrayViewMut2<Intensityf32>,
    ) -> Result<()>;

    fn forward(&self, input: ArrayView2<Intensityf32>, k: Index1_u) -> Result<View> {
        let mut output = self.output_plane().zeros();
        self.forward_accumulate(input, k, output.view_mut())?;
        Ok(output)
    }

    fn backward(&self, output: ArrayView2<Intensityf32>, k: Index1_u) -> Result<View> {
        let mut input = self.input_plane().zeros();
        self.backward_accumulate(output, k, input.view_mut())?;
        Ok(input)
    }

    /// Pipeline applying `self` first, then `next`
    fn then<S: Stage>(self, next: S) -> Then<Self, S> where Self: Sized {
        Then { first: self, second: next }
    }
}

impl Stage for TransportOperator {
    fn input_plane (&self) -> &PlaneGeometry { &self.source().plane }
    fn output_plane(&self) -> &PlaneGeometry { &self.destination().plane }

    fn forward_accumulate(&self, input: ArrayView2<Intensityf32>, k: Index1_u, output: ArrayViewMut2<Intensityf32>) -> Result<()> {
        TransportOperator::forward_accumulate(self, input, k, output)
    }

    fn backward_accumulate(&self, output: ArrayView2<Intensityf32>, k: Index1_u, input: ArrayViewMut2<Intensityf32>) -> Result<()> {
        TransportOperator::backward_accumulate(self, output, k, input)
    }
}

// ----- Mask -----------------------------------------------------------------------------

/// Pixelwise multiplication by a fixed array of transmission factors. The
/// same factors apply to every angular view, and the operation is its own
/// adjoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    plane: PlaneGeometry,
    values: View,
}

impl Mask {
    pub fn new(plane: PlaneGeometry, values: View) -> Result<Self> {
        plane.check_shape(&values)?;
        Ok(Self { plane, values })
    }

    /// Transmission of 1 inside the region where `inside(s, t)` holds, 0
    /// elsewhere. Pixels are tested at their centres.
    pub fn from_fn(plane: PlaneGeometry, inside: impl Fn(Lengthf32, Lengthf32) -> bool) -> Self {
        let (s, t) = (plane.axis(Axis::X), plane.axis(Axis::Y));
        let mut values = plane.zeros();
        for ((i, j), v) in values.indexed_iter_mut() {
            if inside(s.centre(i), t.centre(j)) { *v = 1.0 }
        }
        Self { plane, values }
    }

    pub fn plane (&self) -> &PlaneGeometry { &self.plane }
    pub fn values(&self) -> ArrayView2<Intensityf32> { self.values.view() }

    fn apply(&self, input: ArrayView2<Intensityf32>, mut output: ArrayViewMut2<Intensityf32>) -> Result<()> {
        self.plane.check_shape(&input)?;
        self.plane.check_shape(&output)?;
        let backend = backend::get()?;
        backend.install(|| {
            par_azip!((out in &mut output, &x in &input, &m in &self.values) *out += x * m)
        });
        Ok(())
    }
}

impl Stage for Mask {
    fn input_plane (&self) -> &PlaneGeometry { &self.plane }
    fn output_plane(&self) -> &PlaneGeometry { &self.plane }

    fn forward_accumulate(&self, input: ArrayView2<Intensityf32>, k: Index1_u, output: ArrayViewMut2<Intensityf32>) -> Result<()> {
        let _span = trace_span!("mask forward", k).entered();
        self.apply(input, output)
    }

    fn backward_accumulate(&self, output: ArrayView2<Intensityf32>, k: Index1_u, input: ArrayViewMut2<Intensityf32>) -> Result<()> {
        let _span = trace_span!("mask backward", k).entered();
        self.apply(output, input)
    }
}

// ----- Pipelines ------------------------------------------------------------------------

/// Two stages applied one after the other. The output plane of `first` must
/// have the shape of the input plane of `second`.
#[derive(Clone, Debug)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A, B> Then<A, B> {
    pub fn first (&self) -> &A { &self.first  }
    pub fn second(&self) -> &B { &self.second }
}

impl<A: Stage, B: Stage> Stage for Then<A, B> {
    fn input_plane (&self) -> &PlaneGeometry { self.first .input_plane () }
    fn output_plane(&self) -> &PlaneGeometry { self.second.output_plane() }

    fn forward_accumulate(&self, input: ArrayView2<Intensityf32>, k: Index1_u, output: ArrayViewMut2<Intensityf32>) -> Result<()> {
        self.output_plane().check_shape(&output)?;
        let middle = self.first.forward(input, k)?;
        self.second.forward_accumulate(middle.view(), k, output)
    }

    fn backward_accumulate(&self, output: ArrayView2<Intensityf32>, k: Index1_u, input: ArrayViewMut2<Intensityf32>) -> Result<()> {
        self.input_plane().check_shape(&input)?;
        let middle = self.second.backward(output, k)?;
        self.first.backward_accumulate(middle.view(), k, input)
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use ndarray::{par_azip, ArrayView2, ArrayViewMut2};
use optics::Axis;
use tracing::trace_span;

use crate::backend;
use crate::error::Result;
use crate::plane::PlaneGeometry;
use crate::transport::TransportOperator;
use crate::types::{Index1_u, Intensityf32, Lengthf32, View};
