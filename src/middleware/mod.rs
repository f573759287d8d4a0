pub mod auth;
pub mod response;

pub use auth::resolve_caller_middleware;
pub use response::{ApiResponse, ApiResult};
