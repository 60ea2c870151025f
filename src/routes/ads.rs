use std::str::FromStr;

use actix_web::{HttpResponse, Responder, delete, get, post, put, web};

use crate::cache::MemoryCacheStore;
use crate::domain::ad::NewAd;
use crate::domain::filter::FilterRequest;
use crate::domain::types::AdId;
use crate::forms::ads::{AdForm, AdsQueryForm};
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::service_error_response;
use crate::services::ServiceError;
use crate::services::ads::{
    create_ad as create_ad_service, delete_ad as delete_ad_service, get_ad as get_ad_service,
    get_ads as get_ads_service, update_ad as update_ad_service,
};

fn parse_ad_id(raw: &str) -> Result<AdId, HttpResponse> {
    AdId::from_str(raw).map_err(|e| service_error_response(ServiceError::from(e)))
}

fn parse_ad_form(form: AdForm) -> Result<NewAd, HttpResponse> {
    NewAd::try_from(form).map_err(|e| service_error_response(ServiceError::from(e)))
}

#[get("/v3/ads")]
pub async fn list_ads(
    params: web::Query<Vec<(String, String)>>,
    repo: web::Data<DieselRepository>,
    cache: web::Data<MemoryCacheStore>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let form = AdsQueryForm::from_pairs(params.into_inner());
    let filter: FilterRequest = match form.try_into() {
        Ok(filter) => filter,
        Err(e) => return service_error_response(e.into()),
    };

    match get_ads_service(
        &filter,
        repo.get_ref(),
        cache.get_ref(),
        server_config.cache_ttl(),
    ) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => service_error_response(err),
    }
}

#[get("/v3/ads/{ad_id}")]
pub async fn show_ad(
    ad_id: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let ad_id = match parse_ad_id(&ad_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match get_ad_service(ad_id, repo.get_ref()) {
        Ok(ad) => HttpResponse::Ok().json(ad),
        Err(err) => service_error_response(err),
    }
}

#[post("/v3/ads")]
pub async fn create_ad(
    repo: web::Data<DieselRepository>,
    cache: web::Data<MemoryCacheStore>,
    web::Json(form): web::Json<AdForm>,
) -> impl Responder {
    let new_ad = match parse_ad_form(form) {
        Ok(new_ad) => new_ad,
        Err(response) => return response,
    };

    match create_ad_service(new_ad, repo.get_ref(), cache.get_ref()) {
        Ok(ad) => HttpResponse::Created().json(ad),
        Err(err) => service_error_response(err),
    }
}

#[put("/v3/ads/{ad_id}")]
pub async fn update_ad(
    ad_id: web::Path<String>,
    repo: web::Data<DieselRepository>,
    cache: web::Data<MemoryCacheStore>,
    web::Json(form): web::Json<AdForm>,
) -> impl Responder {
    let ad_id = match parse_ad_id(&ad_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let new_ad = match parse_ad_form(form) {
        Ok(new_ad) => new_ad,
        Err(response) => return response,
    };

    match update_ad_service(ad_id, new_ad, repo.get_ref(), cache.get_ref()) {
        Ok(ad) => HttpResponse::Ok().json(ad),
        Err(err) => service_error_response(err),
    }
}

#[delete("/v3/ads/{ad_id}")]
pub async fn delete_ad(
    ad_id: web::Path<String>,
    repo: web::Data<DieselRepository>,
    cache: web::Data<MemoryCacheStore>,
) -> impl Responder {
    let ad_id = match parse_ad_id(&ad_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match delete_ad_service(ad_id, repo.get_ref(), cache.get_ref()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => service_error_response(err),
    }
}
