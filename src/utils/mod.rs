pub mod error;
pub mod extract;
pub mod response;
pub mod search;
pub mod validation;

pub use error::AppError;
pub use extract::{AppJson, AppPath, AppQuery};
