pub use units::Length;
pub use optics::{Affine1D, Axis, Optics2D, OpticsError};

pub use crate::types::{Lengthf32, Ratiof32, Weightf32, Intensityf32, Index1_u, View};
pub use crate::error::{Chain, ConstructionError, Error, Result};
pub use crate::plane::{PlaneAxis, PlaneGeometry};
pub use crate::angular::{AngularPlane, Basis, Mode};
pub use crate::light_field::LightFieldGeometry;
pub use crate::transport::TransportOperator;
pub use crate::stage::{Mask, Stage, Then};
