use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::services::ServiceError;

pub mod ads;
pub mod main;

/// JSON error body shared by every endpoint.
pub fn error_body(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": message }))
}

/// Map a service failure onto its HTTP response.
pub fn service_error_response(err: ServiceError) -> HttpResponse {
    match err {
        ServiceError::NotFound => error_body(StatusCode::NOT_FOUND, "not found"),
        ServiceError::Form(message) | ServiceError::TypeConstraint(message) => {
            error_body(StatusCode::BAD_REQUEST, &message)
        }
        ServiceError::InvalidPageToken => {
            error_body(StatusCode::BAD_REQUEST, &ServiceError::InvalidPageToken.to_string())
        }
        ServiceError::Internal(message) => {
            error_body(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

/// Register the HTTP surface and its extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = error_body(StatusCode::BAD_REQUEST, &err.to_string());
        InternalError::from_response(err, response).into()
    });
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let response = error_body(StatusCode::BAD_REQUEST, &err.to_string());
        InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .app_data(query_config)
        .service(main::health)
        .service(ads::list_ads)
        .service(ads::create_ad)
        .service(ads::show_ad)
        .service(ads::update_ad)
        .service(ads::delete_ad);
}
