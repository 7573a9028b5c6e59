// Friends Map - Core Library
// Location resolution and map artifact generation pipeline
// Exposes all modules for use in the CLI, web server, and tests

pub mod artifact;
pub mod error;
pub mod geocode;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod social;

// Re-export commonly used types
pub use artifact::{ArtifactEntry, ArtifactStore, MAP_SUFFIX};
pub use error::{MapError, Result};
pub use geocode::{
    GeocodeOutcome, Geocoder, NominatimGeocoder, Resolver, MAX_LOOKUP_ATTEMPTS, MIN_LOOKUP_DELAY,
};
pub use model::{ArtifactHandle, Coordinate, LocationRequest, ResolvedLocation};
pub use pipeline::{resolve_and_render, run_pipeline, RunReport};
pub use render::MapRenderer;
pub use social::SocialGraphClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
