//! Configuration file parser for light-field transport
//!
//! ```toml
//! scale = 1.0
//!
//! [backend]
//! threads = 4
//!
//! [angular]
//! basis = "footprint"
//! mode  = "spatial"
//! n     = [5, 5]
//! pitch = [2.0, 2.0]
//!
//! [source]
//! n      = [40, 30]
//! pitch  = ["0.5 mm", "0.5 mm"]
//! optics = [{ translation = "40 mm" }]
//!
//! [destination]
//! n      = [32, 36]
//! pitch  = ["0.6 mm", "0.35 mm"]
//! optics = [
//!   { translation = "25 mm" },
//!   { lens = { focal_length = "30 mm", center = ["1 mm", "-1.5 mm"] } },
//! ]
//! ```

use std::fs;
use std::str::FromStr;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, de};

use optics::{Optics2D, OpticsError};
use units::{Length, mm, mm_};

use crate::angular::{AngularPlane, Basis, Mode};
use crate::error::{Chain, ConstructionError, Error, Result};
use crate::light_field::LightFieldGeometry;
use crate::plane::PlaneGeometry;
use crate::transport::TransportOperator;
use crate::types::{Lengthf32, Weightf32};

// TOML has no syntax for quantities with units, or for our enums: both are
// written as strings and parsed with `FromStr`.
fn deserialize_from_str<'d, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

fn deserialize_uom_2d<'d, D, T>(deserializer: D) -> Result<(T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y) = <(String, String)>::deserialize(deserializer)?;
    tr_tup_res((x.parse(), y.parse())).map_err(de::Error::custom)
}

/// Transpose 2-tuple of `Result`
///
/// `Ok` if both elements `Ok`; otherwise the first `Err`.
fn tr_tup_res<O, E>((x,y): (Result<O, E>, Result<O, E>)) -> Result<(O, O), E> {
    Ok((x?, y?))
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {

    #[serde(default)]
    pub backend: BackendConfig,

    pub angular: AngularConfig,

    pub source: ViewConfig,

    pub destination: ViewConfig,

    /// Global factor applied to every projection
    #[serde(default = "default_scale")]
    pub scale: Weightf32,
}

/// Settings of the process-wide compute backend
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Size of the thread pool; one thread per core when absent
    pub threads: Option<usize>,
    /// Consecutive items handled by each backprojection job; one job per
    /// thread when absent
    pub job_size: Option<usize>,
}

/// Grid of angular samples on the root plane.
///
/// `pitch`, `offset` and `aperture` are in the units of the root-plane
/// coordinate: millimetres in spatial mode, ray slopes in angular mode.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AngularConfig {
    #[serde(deserialize_with = "deserialize_from_str")]
    pub basis: Basis,

    #[serde(deserialize_with = "deserialize_from_str")]
    pub mode: Mode,

    pub n: (usize, usize),

    pub pitch: (Lengthf32, Lengthf32),

    /// Grid origin offset, in pixels
    #[serde(default)]
    pub offset: (f32, f32),

    /// Keep only the samples within this distance of the origin
    pub aperture: Option<Lengthf32>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    pub n: (usize, usize),

    #[serde(deserialize_with = "deserialize_uom_2d")]
    pub pitch: (Length, Length),

    /// Plane origin offset, in pixels
    #[serde(default)]
    pub offset: (f32, f32),

    /// Optical elements met by rays travelling from this plane to the root
    /// plane, in order
    #[serde(default)]
    pub optics: Vec<Element>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Element {
    Translation(#[serde(deserialize_with = "deserialize_from_str")] Length),
    Lens {
        #[serde(deserialize_with = "deserialize_from_str")]
        focal_length: Length,
        #[serde(default = "on_axis")]
        #[serde(deserialize_with = "deserialize_uom_2d")]
        center: (Length, Length),
    },
}

fn default_scale() -> Weightf32 { 1.0 }
fn on_axis() -> (Length, Length) { (mm(0.0), mm(0.0)) }

impl Element {
    pub fn optics(&self) -> Result<Optics2D, OpticsError> {
        match *self {
            Element::Translation(distance) => Ok(Optics2D::translation(mm_(distance))),
            Element::Lens { focal_length, center: (cx, cy) } =>
                Optics2D::refraction(mm_(focal_length), (mm_(cx), mm_(cy))),
        }
    }
}

impl ViewConfig {
    pub fn plane(&self) -> Result<PlaneGeometry, ConstructionError> {
        PlaneGeometry::new(self.n, (mm_(self.pitch.0), mm_(self.pitch.1)), self.offset)
    }

    pub fn optics_to_root(&self) -> Result<Optics2D, OpticsError> {
        self.optics.iter()
            .try_fold(Optics2D::identity(), |so_far, element| Ok(so_far.then(&element.optics()?)))
    }

    /// `chain` identifies this view in errors
    pub fn light_field(&self, chain: Chain) -> Result<LightFieldGeometry, ConstructionError> {
        let optics_to_root = self.optics_to_root()
            .map_err(|source| ConstructionError::InvalidElement { chain, source })?;
        Ok(LightFieldGeometry::new(self.plane()?, optics_to_root))
    }
}

impl AngularConfig {
    pub fn angular_plane(&self) -> Result<AngularPlane, ConstructionError> {
        let grid = PlaneGeometry::new(self.n, self.pitch, self.offset)?;
        match self.aperture {
            None => AngularPlane::from_plane_geometry(&grid, self.basis, self.mode),
            Some(radius) => {
                let inside = |(s0, s1): (f32, f32), (t0, t1): (f32, f32)| {
                    let (s, t) = ((s0 + s1) / 2.0, (t0 + t1) / 2.0);
                    if s * s + t * t <= radius * radius { 1.0 } else { 0.0 }
                };
                AngularPlane::from_aperture(&grid, self.basis, self.mode, inside)
            }
        }
    }
}

impl Config {
    pub fn transport(&self) -> Result<TransportOperator> {
        let angular = Arc::new(self.angular.angular_plane()?);
        let src = self.source     .light_field(Chain::SourceToRoot)?;
        let dst = self.destination.light_field(Chain::DestinationToRoot)?;
        Ok(TransportOperator::new(src, dst, angular)?.with_scale(self.scale))
    }
}

/// Read and parse `path`, making sure that it describes a valid operator.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_error = |message: String| Error::Config { path: path.to_path_buf(), message };
    let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let config: Config = toml::from_str(&text).map_err(|e| config_error(e.to_string()))?;
    config.transport().map_err(|e| config_error(e.to_string()))?;
    Ok(config)
}
