//! Local web UI for trying prompts against the loaded model.

pub mod routes;
pub mod state;

pub use routes::{create_router, run_generation, GenerateRequest, GenerateResponse};
pub use state::AppState;
