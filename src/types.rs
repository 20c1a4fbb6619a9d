pub use units::todo::{Lengthf32, Ratiof32, Weightf32, Intensityf32};

pub type Index1_u = usize;

/// Index into a sparse row, with the weight of that element
pub type Index1Weightf32 = (Index1_u, Weightf32);

/// Radiance of one angular view of a plane, indexed `[s, t]`. Buffers created
/// by this crate are column-major: `s` varies fastest in memory.
pub type View = ndarray::Array2<Intensityf32>;
