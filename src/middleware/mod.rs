mod error_handler;
mod rate_limit;
mod security_headers;

pub use error_handler::{handle_panic, log_errors};
pub use rate_limit::{RateDecision, RateLimiter, rate_limit};
pub use security_headers::with_security_headers;
