use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use pushkind_adverts::cache::MemoryCacheStore;
use pushkind_adverts::models::config::ServerConfig;
use pushkind_adverts::repository::DieselRepository;
use pushkind_adverts::routes;
use serde_json::{Value, json};

mod common;

fn server_config() -> ServerConfig {
    ServerConfig {
        database_url: ":memory:".into(),
        bind_address: "127.0.0.1".into(),
        port: 0,
        cache_ttl_secs: 300,
        cache_capacity: 100,
    }
}

macro_rules! init_app {
    ($test_db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(DieselRepository::new($test_db.pool())))
                .app_data(web::Data::new(MemoryCacheStore::new(100)))
                .app_data(web::Data::new(server_config()))
                .configure(routes::configure),
        )
        .await
    };
}

fn bike() -> Value {
    json!({
        "title": [{"lang": "en", "text": "Bike"}],
        "description": [{"lang": "en", "text": "Red mountain bike"}],
        "attributes": {"color": "red"},
        "category_ids": [5],
        "status": 3,
        "price": {"amount": 100.0, "currency": 840}
    })
}

#[actix_web::test]
async fn health_reports_ok() {
    let test_db = common::TestDb::new();
    let app = init_app!(test_db);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({"status": "ok"}));
}

#[actix_web::test]
async fn ad_lifecycle_is_visible_through_listing() {
    let test_db = common::TestDb::new();
    let app = init_app!(test_db);

    let req = test::TestRequest::post()
        .uri("/v3/ads")
        .set_json(bike())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().expect("id should be a number");
    assert_eq!(created["category_ids"], json!([5]));
    assert_eq!(created["price"], json!({"amount": 100.0, "currency": 840}));

    let list_uri = "/v3/ads?lang=en&categories=5&properties%5Bcolor%5D=red";
    let req = test::TestRequest::get().uri(list_uri).to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing["total_count"], json!(1));
    assert_eq!(listing["items"][0]["id"], json!(id));
    assert!(listing.get("next_page").is_none());

    let mut replacement = bike();
    replacement["attributes"] = json!({"color": "blue"});
    let req = test::TestRequest::put()
        .uri(&format!("/v3/ads/{id}"))
        .set_json(replacement)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The cached listing must not survive the update.
    let req = test::TestRequest::get().uri(list_uri).to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing["total_count"], json!(0));

    let req = test::TestRequest::get()
        .uri(&format!("/v3/ads/{id}"))
        .to_request();
    let shown: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(shown["attributes"], json!({"color": "blue"}));

    let req = test::TestRequest::delete()
        .uri(&format!("/v3/ads/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/v3/ads/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/v3/ads/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn legacy_body_field_names_are_accepted() {
    let test_db = common::TestDb::new();
    let app = init_app!(test_db);

    let req = test::TestRequest::post()
        .uri("/v3/ads")
        .set_json(json!({
            "title_multi": [{"lang": 1, "text": "Велосипед"}],
            "body_multi": [],
            "price": {"value": 10, "currency": "RUB"}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;

    assert_eq!(created["title"], json!([{"lang": 1, "text": "Велосипед"}]));
    assert!(created.get("description").is_none());
    assert_eq!(created["price"]["currency"], json!(643));
}

#[actix_web::test]
async fn listing_requires_language() {
    let test_db = common::TestDb::new();
    let app = init_app!(test_db);

    let req = test::TestRequest::get().uri("/v3/ads?q=bike").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().expect("error message").contains("lang"));
}

#[actix_web::test]
async fn unknown_page_token_is_a_bad_request() {
    let test_db = common::TestDb::new();
    let app = init_app!(test_db);

    let req = test::TestRequest::get()
        .uri("/v3/ads?lang=en&next_page=12345")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "invalid page token"}));
}

#[actix_web::test]
async fn malformed_input_is_rejected_before_the_store() {
    let test_db = common::TestDb::new();
    let app = init_app!(test_db);

    let req = test::TestRequest::put()
        .uri("/v3/ads/abc")
        .set_json(bike())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/v3/ads")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"title\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());

    let req = test::TestRequest::post()
        .uri("/v3/ads")
        .set_json(json!({"title": [{"lang": "en", "text": "Bike"}], "status": 42}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/v3/ads?lang=en&sort=cheapest")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn oversized_page_size_is_a_bad_request() {
    let test_db = common::TestDb::new();
    let app = init_app!(test_db);

    let req = test::TestRequest::get()
        .uri("/v3/ads?lang=en&page_size=100")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/v3/ads?lang=en&page_size=9223372036854775807")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains("page_size")
    );
}
