//! Error conversion glue between layers.
//!
//! The domain layer must not depend on service/repository error types, so the
//! conversions live here instead.

use crate::domain::types::TypeConstraintError;
use crate::repository::RepositoryError;

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::ValidationError(val.to_string())
    }
}

#[cfg(feature = "server")]
mod server {
    use crate::domain::types::TypeConstraintError;
    use crate::forms::ads::{AdFormError, AdsQueryFormError};
    use crate::services::ServiceError;

    impl From<TypeConstraintError> for ServiceError {
        fn from(val: TypeConstraintError) -> Self {
            ServiceError::TypeConstraint(val.to_string())
        }
    }

    impl From<AdsQueryFormError> for ServiceError {
        fn from(val: AdsQueryFormError) -> Self {
            ServiceError::Form(val.to_string())
        }
    }

    impl From<AdFormError> for ServiceError {
        fn from(val: AdFormError) -> Self {
            ServiceError::Form(val.to_string())
        }
    }
}
