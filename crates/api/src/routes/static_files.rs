use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use rust_embed::RustEmbed;

use crate::AppState;

/// Dashboard page and assets, embedded at compile time.
#[derive(RustEmbed)]
#[folder = "../../frontend/"]
struct FrontendAssets;

pub fn static_router() -> Router<AppState> {
    Router::new().fallback(serve_static)
}

async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match FrontendAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            asset_response(mime.as_ref(), content.data.into_owned())
        }
        // Unknown paths fall back to the dashboard page
        None => match FrontendAssets::get("index.html") {
            Some(index) => asset_response("text/html; charset=utf-8", index.data.into_owned()),
            None => (StatusCode::NOT_FOUND, "Dashboard not bundled").into_response(),
        },
    }
}

fn asset_response(content_type: &str, body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, content_type.to_string())], Body::from(body)).into_response()
}
