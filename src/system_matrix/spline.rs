//! Piecewise-linear kernels: the images of box-shaped lixels on the source
//! plane.
//!
//! + `Rect`: a destination pixel of a point-sampled lixel. A box, collapsing
//!   to a Dirac spike where the destination pixel maps onto a single point.
//!
//! + `Trapezoid`: a destination pixel smeared by the angular footprint of a
//!   footprint-sampled lixel. The convolution of two boxes, collapsing to a
//!   box or a spike when either or both have no extent.

use super::Kernel;

// Breakpoints which should coincide with pixel edges usually miss them very
// slightly. Treat anything this close to an edge as being exactly on it.
const SNAP: f64 = 1e-4;

#[inline]
fn snap(x: f64) -> f64 {
    let edge = x.round();
    if (x - edge).abs() < SNAP { edge } else { x }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    t0: f64,
    t1: f64,
}

impl Kernel for Rect {
    fn new(centre: f64, width: f64, _footprint: f64) -> Self {
        if width < SNAP {
            let c = snap(centre);
            return Self { t0: c, t1: c };
        }
        let half = width / 2.0;
        Self { t0: snap(centre - half), t1: snap(centre + half) }
    }

    fn support(&self) -> (f64, f64) { (self.t0, self.t1) }

    fn cdf(&self, x: f64) -> f64 {
        let Self { t0, t1 } = *self;
        if      x <= t0 { 0.0 }
        else if x >= t1 { 1.0 }
        else            { (x - t0) / (t1 - t0) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trapezoid {
    t: [f64; 4],
}

impl Kernel for Trapezoid {
    fn new(centre: f64, width: f64, footprint: f64) -> Self {
        let (wide, narrow) = (width.max(footprint), width.min(footprint));
        if wide < SNAP {
            let c = snap(centre);
            return Self { t: [c; 4] };
        }
        let (outer, inner) = ((wide + narrow) / 2.0, (wide - narrow) / 2.0);
        Self { t: [centre - outer, centre - inner, centre + inner, centre + outer].map(snap) }
    }

    fn support(&self) -> (f64, f64) { (self.t[0], self.t[3]) }

    fn cdf(&self, x: f64) -> f64 {
        let [t0, t1, t2, t3] = self.t;
        if x <= t0 { return 0.0 }
        if x >= t3 { return 1.0 }
        // Plateau height giving unit area
        let height = 2.0 / ((t3 - t0) + (t2 - t1));
        if x < t1 {
            height * (x - t0).powi(2) / (2.0 * (t1 - t0))
        } else if x <= t2 {
            height * ((t1 - t0) / 2.0 + (x - t1))
        } else {
            1.0 - height * (t3 - x).powi(2) / (2.0 * (t3 - t2))
        }
    }
}
