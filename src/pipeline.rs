// Pipeline - social fetch → resolve → render, in a straight line
//
// Per-item geocoding failures are absorbed by the resolver; only
// run-fatal conditions (credential rejection, artifact I/O) propagate.

use crate::error::Result;
use crate::geocode::{Geocoder, NominatimGeocoder, Resolver};
use crate::model::{ArtifactHandle, LocationRequest};
use crate::render::MapRenderer;
use crate::social::SocialGraphClient;
use std::path::Path;
use tracing::info;

/// Summary of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// Entities that had a location string
    pub requested: usize,

    /// Entities that resolved to a coordinate and became markers
    pub resolved: usize,

    /// Entities silently dropped during resolution
    pub dropped: usize,

    pub artifact: ArtifactHandle,
}

/// Resolve a prepared request set and render it under `key`
pub async fn resolve_and_render<G: Geocoder>(
    resolver: &Resolver<G>,
    renderer: &MapRenderer,
    requests: &[LocationRequest],
    key: &str,
) -> Result<RunReport> {
    let resolved = resolver.resolve(requests).await;
    let artifact = renderer.render(&resolved, key)?;

    let report = RunReport {
        requested: requests.len(),
        resolved: resolved.len(),
        dropped: requests.len() - resolved.len(),
        artifact,
    };
    info!(
        requested = report.requested,
        resolved = report.resolved,
        dropped = report.dropped,
        "pipeline run complete"
    );
    Ok(report)
}

/// Full run against the live services: fetch the user's friends,
/// resolve their locations, and write `{username}_map.html` under
/// `static_dir`.
pub async fn run_pipeline(username: &str, token: &str, static_dir: &Path) -> Result<RunReport> {
    let social = SocialGraphClient::new()?;
    let requests = social.friend_locations(username, token).await?;

    let resolver = Resolver::new(NominatimGeocoder::new()?);
    let renderer = MapRenderer::new(static_dir);

    resolve_and_render(&resolver, &renderer, &requests, username).await
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::GeocodeOutcome;
    use crate::model::Coordinate;
    use async_trait::async_trait;
    use std::fs;
    use std::time::Duration;

    /// Geocoder that knows a fixed set of places
    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn lookup(&self, query: &str) -> GeocodeOutcome {
            match query {
                "Paris" => GeocodeOutcome::Found(Coordinate {
                    lat: 48.8566,
                    lon: 2.3522,
                }),
                _ => GeocodeOutcome::NoMatch,
            }
        }
    }

    fn test_resolver() -> Resolver<FixedGeocoder> {
        Resolver::new(FixedGeocoder).with_min_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_markers_never_exceed_requests() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());

        let requests = vec![
            LocationRequest::new("alice", "Paris"),
            LocationRequest::new("bob", "Nowhereistan12345"),
        ];
        let report = resolve_and_render(&test_resolver(), &renderer, &requests, "alice_and_bob")
            .await
            .unwrap();

        assert!(report.resolved <= report.requested);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.dropped, 1);

        let html = fs::read_to_string(&report.artifact.path).unwrap();
        assert!(html.contains(r#""name":"alice""#));
        assert!(!html.contains("bob"));
    }

    #[tokio::test]
    async fn test_empty_request_set_still_renders() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());

        let report = resolve_and_render(&test_resolver(), &renderer, &[], "nobody")
            .await
            .unwrap();

        assert_eq!(report.requested, 0);
        assert_eq!(report.resolved, 0);
        assert!(report.artifact.path.exists());
    }
}
