//! API layer - HTTP endpoints and middleware

pub mod health;
pub mod middleware;
pub mod report;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
