// Friends Map - Web Server
// Thin web layer over the pipeline: submit a username + token, get a
// shareable map; list and remove stored maps.

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use friends_map::{run_pipeline, ArtifactStore, MapError, MAP_SUFFIX};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    static_dir: Arc<PathBuf>,
}

impl AppState {
    fn store(&self) -> ArtifactStore {
        ArtifactStore::new(self.static_dir.as_path())
    }
}

/// POST / form body
#[derive(Deserialize)]
struct GenerateForm {
    user_name: String,
    token: String,
}

/// GET /remove query string
#[derive(Deserialize)]
struct RemoveParams {
    maps: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - index with the submission form and stored maps
async fn index(State(state): State<AppState>) -> Html<String> {
    let mut items = String::new();
    for entry in state.store().entries() {
        let modified = entry
            .modified
            .map(|m| m.format(" (%Y-%m-%d %H:%M)").to_string())
            .unwrap_or_default();
        items.push_str(&format!(
            r#"<li><a href="/maps/{name}">{name}</a>{modified} <a href="/remove?maps={name}">remove</a></li>"#,
            name = urlencoding::encode(&entry.name),
            modified = modified,
        ));
    }

    let maps_section = if items.is_empty() {
        "<p>No maps generated yet.</p>".to_string()
    } else {
        format!("<ul>{}</ul>", items)
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Friends Map</title></head>
<body>
<h1>Friends Map</h1>
<form method="post" action="/">
  <label>User name <input name="user_name" required></label>
  <label>Bearer token <input name="token" type="password" required></label>
  <button type="submit">Generate map</button>
</form>
<h2>Stored maps</h2>
{maps_section}
</body>
</html>
"#
    ))
}

/// POST / - run the pipeline and redirect to the fresh artifact
async fn generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> impl IntoResponse {
    match run_pipeline(&form.user_name, &form.token, &state.static_dir).await {
        Ok(report) => {
            let name = format!("{}{}", report.artifact.key, MAP_SUFFIX);
            Redirect::to(&format!("/maps/{}", urlencoding::encode(&name))).into_response()
        }
        Err(MapError::Auth(message)) => (
            StatusCode::UNAUTHORIZED,
            fail_page(&format!("Could not fetch friends: {}", message)),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error generating map: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                fail_page("Could not generate the map. Please try again."),
            )
                .into_response()
        }
    }
}

/// GET /remove?maps=<name> - delete a stored map
async fn remove(State(state): State<AppState>, Query(params): Query<RemoveParams>) -> impl IntoResponse {
    match state.store().remove(&params.maps) {
        Ok(()) => Redirect::to("/").into_response(),
        Err(MapError::ArtifactNotFound(name)) => (
            StatusCode::NOT_FOUND,
            fail_page(&format!("No such map: {}", name)),
        )
            .into_response(),
        Err(MapError::InvalidArtifactName(name)) => (
            StatusCode::BAD_REQUEST,
            fail_page(&format!("Invalid map name: {}", name)),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error removing map: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                fail_page("Could not remove the map."),
            )
                .into_response()
        }
    }
}

fn fail_page(message: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Friends Map</title></head>
<body><p>{}</p><p><a href="/">Back</a></p></body>
</html>
"#,
        message
    ))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("🌐 Friends Map - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let static_dir = std::env::var("FRIENDS_MAP_STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("static"));
    std::fs::create_dir_all(&static_dir).expect("Failed to create artifact directory");
    println!("✓ Artifact directory: {:?}", static_dir);

    let state = AppState {
        static_dir: Arc::new(static_dir.clone()),
    };

    let app = Router::new()
        .route("/", get(index).post(generate))
        .route("/remove", get(remove))
        .nest_service("/maps", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = "0.0.0.0:8000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:8000");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
