//! Physical quantities used at the boundaries of the light-field code.
//!
//! Configuration files and tests speak `uom` quantities (`"0.5 mm"`), while
//! the numerical core works with the plain `f32` aliases found in [`todo`],
//! always expressed in millimetres. The conversion happens in exactly one
//! place: the `mm` / `mm_` pair below.

pub use uom;
pub use float_eq;

pub mod todo;

pub mod mm {

  use uom::si::{
    length::millimeter,
    mass::kilogram,
    time::second,
    electric_current::ampere,
    thermodynamic_temperature::kelvin,
    amount_of_substance::mole,
    luminous_intensity::candela,
  };

  // Storing lengths in millimetres means that `mm(x)` followed by `mm_` is
  // exact, which the optics configuration relies upon.
  pub mod f32 {
    use uom::{ISQ, system};
    ISQ!(uom::si, f32, (millimeter, kilogram, second, ampere, kelvin, mole, candela));
  }
}

pub use mm::f32::Length;
mod units {
  pub use uom::si::length::{micrometer, millimeter, centimeter, meter};
}

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(um    Length micrometer);
wrap!(mm    Length millimeter);
wrap!(cm    Length centimeter);
wrap!(m     Length      meter);

// Reverse direction of the above
pub fn mm_(x: Length) -> f32 { x.get::<units::millimeter>() }

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    $crate::float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
