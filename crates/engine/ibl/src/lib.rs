//! Environment lighting prefilter
//!
//! Turns a source cubemap into a spherical-harmonics irradiance cubemap and a
//! cosine-power radiance mip chain for image-based lighting.

mod cubemap;
mod error;

pub mod face;
pub mod filter;
pub mod footprint;
pub mod kernel;
pub mod queue;
pub mod sh;
pub mod tap_table;
pub mod worker;

// Strip import/export through the image crate
#[cfg(feature = "image")]
mod io;

pub use cubemap::{mip_extent, Image, TEXEL_BYTES};
pub use error::{Error, Result};
pub use face::{CubeFace, FaceEdge};
pub use filter::{compute_radiance, LightingModel, RadianceOptions};
pub use sh::{compute_irradiance, project_to_sh, ShCoefficients};
pub use tap_table::{EdgeFixup, TapTable};

// Re-export for convenience
pub use glam;
