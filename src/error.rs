use std::path::PathBuf;

use thiserror::Error;

use optics::{Axis, OpticsError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("construction failed: {0}")]
    Construction(#[from] ConstructionError),

    #[error("unknown {kind} `{value}`")]
    Domain { kind: &'static str, value: String },

    #[error("buffer has shape {found:?} but the plane geometry requires {expected:?}")]
    ShapeMismatch { expected: (usize, usize), found: (usize, usize) },

    #[error("angular sample {index} requested, but the angular plane has only {num_points}")]
    IndexOutOfRange { index: usize, num_points: usize },

    #[error("compute backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("configuration `{path}`: {message}")]
    Config { path: PathBuf, message: String },
}

/// Which optical chain failed to invert during operator construction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chain { SourceToRoot, DestinationToRoot, SourceToDestination }

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Chain::SourceToRoot        => "source to root",
            Chain::DestinationToRoot   => "destination to root",
            Chain::SourceToDestination => "source to destination",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("plane must have at least one pixel along each axis, got {ns} x {nt}")]
    EmptyPlane { ns: usize, nt: usize },

    #[error("{what} must be positive and finite, got {value}")]
    InvalidPitch { what: &'static str, value: f32 },

    #[error("angular sample arrays differ in length: {u} u, {v} v, {w} w")]
    MismatchedLengths { u: usize, v: usize, w: usize },

    #[error("angular sample {index} has a non-finite coordinate or weight")]
    NonFinite { index: usize },

    #[error("{chain} optics: {source}")]
    NonInvertible { chain: Chain, source: OpticsError },

    #[error("{chain} optics: invalid element: {source}")]
    InvalidElement { chain: Chain, source: OpticsError },

    #[error("{axis} axis: the angular plane constraint does not determine the ray angle on the destination plane")]
    DegenerateParametrization { axis: Axis },

    #[error("cannot partition angular samples into zero subsets")]
    NoSubsets,
}
