mod origin_guard;
mod requests_logging;

pub use origin_guard::{is_origin_allowed, require_allowed_origin};
pub use requests_logging::{log_requests, RequestsLoggingLevel, UNMATCHED_ROUTE};
