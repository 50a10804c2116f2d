//! HTTP surface of the bus station service.
//!
//! JSON endpoints for the station directory and closest-station queries.

mod directions;
mod dto;
mod routes;
mod state;

pub use directions::directions_url;
pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
