mod exports;
pub use exports::*;

pub mod error;
pub mod types;
pub mod plane;
pub mod angular;
pub mod light_field;
pub mod system_matrix;
pub mod transport;
pub mod stage;
pub mod backend;
pub mod config;
