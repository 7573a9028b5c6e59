// Renderer - resolved locations → self-contained interactive HTML map
//
// Pure serialization over already-resolved coordinates; no network I/O
// happens here (the Leaflet assets are CDN links resolved by the
// browser). The artifact is written to a temp file in the target
// directory and renamed into place, so a partial write is never
// observable and a failed render leaves the previous artifact intact.

use crate::artifact::{self, MAP_SUFFIX};
use crate::error::{MapError, Result};
use crate::model::{ArtifactHandle, ResolvedLocation};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::info;

/// Marker data embedded into the artifact as a JSON payload
#[derive(Serialize)]
struct Marker<'a> {
    name: &'a str,
    lat: f64,
    lon: f64,
}

pub struct MapRenderer {
    static_dir: PathBuf,
}

impl MapRenderer {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        MapRenderer {
            static_dir: static_dir.into(),
        }
    }

    /// Render one marker per resolved entry into `{key}_map.html`.
    /// An empty resolved set still produces a valid, markerless map.
    pub fn render(&self, resolved: &[ResolvedLocation], key: &str) -> Result<ArtifactHandle> {
        artifact::validate_key(key)?;

        let path = self.static_dir.join(format!("{}{}", key, MAP_SUFFIX));
        let html = render_html(resolved);

        fs::create_dir_all(&self.static_dir).map_err(|e| MapError::Render {
            path: path.clone(),
            source: e,
        })?;

        // Atomic replace: write next to the target, then rename over it
        let mut tmp = NamedTempFile::new_in(&self.static_dir).map_err(|e| MapError::Render {
            path: path.clone(),
            source: e,
        })?;
        tmp.write_all(html.as_bytes()).map_err(|e| MapError::Render {
            path: path.clone(),
            source: e,
        })?;
        tmp.persist(&path).map_err(|e| MapError::Render {
            path: path.clone(),
            source: e.error,
        })?;

        info!(key, markers = resolved.len(), path = %path.display(), "map artifact written");

        Ok(ArtifactHandle {
            key: key.to_string(),
            path,
        })
    }
}

fn render_html(resolved: &[ResolvedLocation]) -> String {
    let markers: Vec<Marker> = resolved
        .iter()
        .map(|r| Marker {
            name: &r.entity_name,
            lat: r.coordinate.lat,
            lon: r.coordinate.lon,
        })
        .collect();

    // Plain floats and strings; serialization cannot realistically fail
    let payload = serde_json::to_string(&markers)
        .unwrap_or_else(|_| "[]".to_string())
        // Keep the inline <script> well-formed for names containing "</"
        .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Friends Map</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var points = {payload};
var map = L.map('map').setView([0, 0], 2);
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    maxZoom: 19,
    attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
var markers = L.featureGroup();
points.forEach(function (p) {{
    L.marker([p.lat, p.lon]).bindPopup(p.name).addTo(markers);
}});
markers.addTo(map);
L.control.layers(null, {{ "Markers": markers }}).addTo(map);
if (points.length > 0) {{
    map.fitBounds(markers.getBounds().pad(0.2));
}}
</script>
</body>
</html>
"#
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    fn resolved(name: &str, lat: f64, lon: f64) -> ResolvedLocation {
        ResolvedLocation {
            entity_name: name.to_string(),
            raw_location: format!("somewhere for {}", name),
            coordinate: Coordinate { lat, lon },
        }
    }

    /// Pull the embedded marker payload back out of a rendered artifact
    fn extract_markers(html: &str) -> Vec<serde_json::Value> {
        let line = html
            .lines()
            .find_map(|l| l.strip_prefix("var points = "))
            .expect("marker payload missing");
        serde_json::from_str(line.trim_end_matches(';')).expect("marker payload not JSON")
    }

    #[test]
    fn test_render_one_marker_per_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());

        let set = vec![
            resolved("alice", 48.8566, 2.3522),
            resolved("bob", 50.4501, 30.5234),
        ];
        let handle = renderer.render(&set, "alice_and_bob").unwrap();

        assert_eq!(handle.path, tmp.path().join("alice_and_bob_map.html"));
        let html = fs::read_to_string(&handle.path).unwrap();

        let markers = extract_markers(&html);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0]["name"], "alice");
        assert!((markers[0]["lat"].as_f64().unwrap() - 48.8566).abs() < 1e-9);
        assert_eq!(markers[1]["name"], "bob");
    }

    #[test]
    fn test_render_empty_set_is_valid_markerless_map() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());

        let handle = renderer.render(&[], "empty").unwrap();
        let html = fs::read_to_string(&handle.path).unwrap();

        assert!(extract_markers(&html).is_empty());
        assert!(html.contains("L.control.layers"));
    }

    #[test]
    fn test_render_has_toggleable_marker_layer() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());

        let handle = renderer.render(&[resolved("alice", 1.0, 2.0)], "alice").unwrap();
        let html = fs::read_to_string(&handle.path).unwrap();

        assert!(html.contains(r#"L.control.layers(null, { "Markers": markers })"#));
    }

    #[test]
    fn test_rerender_overwrites_with_same_marker_content() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());
        let set = vec![resolved("alice", 48.8566, 2.3522)];

        let first = renderer.render(&set, "alice").unwrap();
        let before = extract_markers(&fs::read_to_string(&first.path).unwrap());

        let second = renderer.render(&set, "alice").unwrap();
        let after = extract_markers(&fs::read_to_string(&second.path).unwrap());

        assert_eq!(first.path, second.path);
        assert_eq!(before, after);
    }

    #[test]
    fn test_render_rejects_unsafe_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());

        for key in ["../alice", "a/b", ""] {
            let err = renderer.render(&[], key).unwrap_err();
            assert!(matches!(err, MapError::InvalidArtifactName(_)));
        }
    }

    #[test]
    fn test_render_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("static");
        let renderer = MapRenderer::new(&nested);

        let handle = renderer.render(&[], "alice").unwrap();
        assert!(handle.path.exists());
    }

    #[test]
    fn test_marker_names_cannot_break_out_of_script() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = MapRenderer::new(tmp.path());

        let set = vec![resolved("</script><script>alert(1)", 1.0, 2.0)];
        let handle = renderer.render(&set, "sneaky").unwrap();
        let html = fs::read_to_string(&handle.path).unwrap();

        assert!(!html.contains("</script><script>alert"));
    }
}
