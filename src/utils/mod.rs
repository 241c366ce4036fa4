pub mod response;
pub mod time;
pub mod validation;

pub use response::{ApiError, ApiResponse};
