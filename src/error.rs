// Error taxonomy for the pipeline and artifact store
//
// Per-item geocoding failures never show up here: the resolver drops
// those items silently. Only run-fatal conditions and artifact-store
// failures are surfaced to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// The social-graph provider rejected the supplied credentials.
    /// Fatal to the whole pipeline run; no partial output is produced.
    #[error("social graph rejected credentials: {0}")]
    Auth(String),

    /// Transport-level failure talking to the social-graph provider.
    #[error("social graph request failed")]
    SocialGraph(#[source] reqwest::Error),

    /// Could not build the underlying HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    /// I/O failure while writing a map artifact. The previous artifact
    /// under the same key, if any, is left intact.
    #[error("failed to write map artifact {path:?}")]
    Render {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removal was requested for an artifact that does not exist.
    #[error("no such map artifact: {0}")]
    ArtifactNotFound(String),

    /// The artifact key or filename failed validation (empty, wrong
    /// suffix, path separators, traversal sequences).
    #[error("invalid artifact name: {0}")]
    InvalidArtifactName(String),

    /// Unexpected artifact-store I/O failure (permissions etc).
    #[error("artifact store I/O failure")]
    Io(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
