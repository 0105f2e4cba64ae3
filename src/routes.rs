use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{web, HttpRequest};

use crate::auth::TokenIssuer;
use crate::errors::AppError;
use crate::handlers::{self, admin, auth, products, stats, upload};
use crate::middleware::AuthMiddleware;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid path: {}", err)).into()
}

/// Registers the whole `/api` tree. Everything except the health check and
/// sign-in sits behind the bearer token middleware; unknown paths answer 404.
pub fn configure(tokens: TokenIssuer) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let guarded = |path: &str| web::resource(path).wrap(AuthMiddleware::new(tokens.clone()));

        cfg.app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/auth/signin", web::post().to(auth::sign_in))
                    .service(guarded("/auth/session").route(web::get().to(auth::session)))
                    .service(
                        guarded("/products")
                            .route(web::get().to(products::list_products))
                            .route(web::post().to(products::create_product)),
                    )
                    .service(guarded("/products/stats").route(web::get().to(stats::product_stats)))
                    .service(
                        guarded("/products/{id}")
                            .route(web::get().to(products::get_product))
                            .route(web::put().to(products::update_product))
                            .route(web::delete().to(products::delete_product)),
                    )
                    .service(guarded("/upload").route(web::post().to(upload::upload_image)))
                    .service(guarded("/admin/onboard").route(web::post().to(admin::onboard_admin)))
                    .default_service(web::to(handlers::not_found)),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::state::testing::offline_state;
    use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use mongodb::bson::oid::ObjectId;
    use serde_json::{json, Value};

    const BOUNDARY: &str = "catalogboundary";

    fn bearer(tokens: &TokenIssuer, role: Role) -> (actix_web::http::header::HeaderName, String) {
        let mut user = User::new_admin("Ada", "ada@example.com", String::new());
        user.id = Some(ObjectId::new());
        user.role = role;
        (AUTHORIZATION, format!("Bearer {}", tokens.issue(&user).unwrap()))
    }

    fn multipart(field: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"upload.bin\"\r\nContent-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            f = field,
            ct = content_type
        )
        .into_bytes();
        out.extend_from_slice(body);
        out.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        out
    }

    macro_rules! app {
        ($state:expr) => {{
            let state = $state;
            test::init_service(
                App::new()
                    .app_data(web::Data::new(state.clone()))
                    .configure(configure(state.tokens.clone())),
            )
            .await
        }};
    }

    macro_rules! upload_request {
        ($tokens:expr, $body:expr) => {
            test::TestRequest::post()
                .uri("/api/upload")
                .insert_header(bearer(&$tokens, Role::Admin))
                .insert_header((
                    CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                ))
                .set_payload($body)
                .to_request()
        };
    }

    #[actix_web::test]
    async fn health_needs_no_session() {
        let app = app!(offline_state().await);
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[actix_web::test]
    async fn catalog_routes_require_a_session() {
        let app = app!(offline_state().await);
        for uri in ["/api/products", "/api/products/stats", "/api/auth/session"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let err = test::try_call_service(&app, req).await.unwrap_err();
            assert_eq!(
                err.as_response_error().status_code(),
                StatusCode::UNAUTHORIZED,
                "{}",
                uri
            );
        }
    }

    #[actix_web::test]
    async fn non_admin_cannot_read_stats() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/products/stats")
            .insert_header(bearer(&tokens, Role::User))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unauthorized");
    }

    #[actix_web::test]
    async fn session_echoes_claims() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/auth/session")
            .insert_header(bearer(&tokens, Role::Admin))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["role"], "admin");
    }

    #[actix_web::test]
    async fn malformed_product_id_is_rejected() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/products/not-an-id")
            .insert_header(bearer(&tokens, Role::Admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid product id");
    }

    #[actix_web::test]
    async fn invalid_product_is_rejected_with_details() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(&tokens, Role::Admin))
            .set_json(json!({
                "name": "Mug",
                "description": "short",
                "price": -2.0,
                "stock": 3,
                "category": "Kitchen",
                "sku": "MUG 01",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Validation failed");
        let details: Vec<String> = serde_json::from_value(body["details"].clone()).unwrap();
        assert!(details.contains(&"Price must be positive".to_string()));
        assert!(details.contains(&"Description must be at least 10 characters".to_string()));
        assert!(details.contains(&"SKU must be uppercase alphanumeric with hyphens".to_string()));
    }

    #[actix_web::test]
    async fn malformed_json_is_a_json_error() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(&tokens, Role::Admin))
            .insert_header((CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[actix_web::test]
    async fn onboarding_validates_before_touching_storage() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/admin/onboard")
            .insert_header(bearer(&tokens, Role::Admin))
            .set_json(json!({ "name": "Bob", "email": "bob", "password": "123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn upload_rejects_non_images() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = upload_request!(tokens, multipart("file", "text/plain", b"hello"));
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "File must be an image");
    }

    #[actix_web::test]
    async fn upload_requires_a_file_field() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = upload_request!(tokens, multipart("other", "image/png", b"\x89PNG"));
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "No file provided");
    }

    #[actix_web::test]
    async fn upload_rejects_files_over_five_megabytes() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let big = vec![0u8; upload::MAX_UPLOAD_BYTES + 1];
        let req = upload_request!(tokens, multipart("file", "image/jpeg", &big));
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "File size must be less than 5MB");
    }

    #[actix_web::test]
    async fn upload_without_media_credentials_reports_configuration() {
        let state = offline_state().await;
        let tokens = state.tokens.clone();
        let app = app!(state);

        let req = upload_request!(tokens, multipart("file", "image/png", b"\x89PNG\r\n"));
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], crate::cloudinary::MISSING_CREDENTIALS);
        assert!(body["hint"].is_string());
    }

    #[actix_web::test]
    async fn unknown_api_path_is_not_found() {
        let app = app!(offline_state().await);
        let req = test::TestRequest::get().uri("/api/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Not found");
    }

    #[actix_web::test]
    async fn extractor_errors_become_json() {
        let req = test::TestRequest::default().to_http_request();
        let err = json_error(JsonPayloadError::ContentType, &req);
        assert_eq!(err.as_response_error().status_code(), StatusCode::BAD_REQUEST);
    }
}
