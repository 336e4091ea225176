mod handlers;
mod middleware;
mod router;
mod state;

pub use router::{build_router, run_http_server};
pub use state::AppState;
