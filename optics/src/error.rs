use thiserror::Error;

use crate::Axis;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpticsError {
    #[error("a thin lens with zero focal length has no defined optical power")]
    ZeroFocalLength,

    #[error("affine map is not invertible: determinant of linear part is {determinant}")]
    NonInvertible { determinant: f32 },

    #[error("{axis} axis: {source}")]
    OnAxis { axis: Axis, source: Box<OpticsError> },
}

impl OpticsError {
    /// Attribute this error to one of the transverse axes
    pub fn on_axis(self, axis: Axis) -> Self {
        Self::OnAxis { axis, source: Box::new(self) }
    }

    /// The underlying error, ignoring axis attribution
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::OnAxis { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
