/// Quantities which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// The transport kernels work on raw `f32`s in millimetres (lengths) and
/// dimensionless slopes (ray angles), because `ndarray` buffers and the
/// affine coefficients mix these freely. The aliases still give some clues
/// in the source as to what a value represents.

pub type Lengthf32    = f32;
pub type Ratiof32     = f32;
pub type Weightf32    = f32;
pub type Intensityf32 = f32; // TODO uom Radiance
