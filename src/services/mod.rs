pub mod ads;
pub mod errors;

pub use errors::{ServiceError, ServiceResult};
