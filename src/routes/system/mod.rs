mod handler;
mod model;

pub use handler::{health, not_found, service_info};
pub use model::AVAILABLE_ENDPOINTS;
