//! Paraxial ray optics as affine maps over (position, angle) pairs.
//!
//! A ray crossing a plane is described, per transverse axis, by its position
//! `p` on the plane and its angle (slope) `a`. Free-space propagation and
//! thin lenses act on `(p, a)` as affine maps, [`Affine1D`]; a 2D optical
//! system is one such map per axis, [`Optics2D`].

mod affine;
mod error;
mod optics2d;

pub use affine::Affine1D;
pub use error::OpticsError;
pub use optics2d::{Axis, Optics2D};
