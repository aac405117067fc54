//! HTTP routes for the generation demo.
//!
//! Two routes: the embedded single-page UI and the JSON generation
//! endpoint behind it. The generation handler is infallible — any engine
//! failure is rendered into the response text, so the browser always has
//! something to show.

use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::GenerationConfig;

use super::state::AppState;

/// The demo page, compiled into the binary.
const UI_PAGE: &str = include_str!("../../assets/index.html");

/// Bounds for the request parameters, matching the UI sliders.
const MAX_LENGTH_RANGE: (usize, usize) = (10, 200);
const TEMPERATURE_RANGE: (f32, f32) = (0.1, 2.0);
const TOP_P_RANGE: (f32, f32) = (0.1, 1.0);

/// Body of a generation request. Sampling fields default to the slider
/// defaults shown in the UI.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Input prompt.
    pub prompt: String,
    /// Maximum number of new tokens.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Nucleus sampling mass.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_max_length() -> usize {
    100
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

/// Body of a generation response.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text, or an `"Error: …"` message.
    pub text: String,
}

/// Create the router for the demo server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/generate", post(generate))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(UI_PAGE)
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Json<GenerateResponse> {
    Json(GenerateResponse {
        text: run_generation(&state, &request).await,
    })
}

/// Runs one generation and renders any failure into the returned string.
pub async fn run_generation(state: &AppState, request: &GenerateRequest) -> String {
    let config = sampling_config(request);

    let mut generator = state.generator.lock().await;
    match generator.generate(&request.prompt, &config) {
        Ok(output) => output.text,
        Err(err) => {
            warn!(error = %err, "generation failed");
            format!("Error: {err}")
        }
    }
}

/// Maps request parameters onto a sampling config, clamping each value to
/// the range the UI offers.
fn sampling_config(request: &GenerateRequest) -> GenerationConfig {
    GenerationConfig::default()
        .max_new_tokens(request.max_length.clamp(MAX_LENGTH_RANGE.0, MAX_LENGTH_RANGE.1))
        .temperature(
            request
                .temperature
                .clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
        )
        .top_p(request.top_p.clamp(TOP_P_RANGE.0, TOP_P_RANGE.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_match_the_sliders() {
        let request: GenerateRequest = serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();

        assert_eq!(request.prompt, "hi");
        assert_eq!(request.max_length, 100);
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.top_p, 0.9);
    }

    #[test]
    fn out_of_range_parameters_are_clamped() {
        let request = GenerateRequest {
            prompt: "hi".into(),
            max_length: 10_000,
            temperature: 99.0,
            top_p: 0.0,
        };

        let config = sampling_config(&request);

        assert_eq!(config.max_new_tokens, 200);
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.top_p, 0.1);
    }

    #[test]
    fn in_range_parameters_pass_through() {
        let request = GenerateRequest {
            prompt: "hi".into(),
            max_length: 50,
            temperature: 0.7,
            top_p: 0.9,
        };

        let config = sampling_config(&request);

        assert_eq!(config.max_new_tokens, 50);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 0.9);
    }

    #[test]
    fn ui_page_is_embedded() {
        assert!(UI_PAGE.contains("</html>"));
    }
}
