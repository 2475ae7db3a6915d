use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, Responder, get, middleware::from_fn, web};
use anyhow::anyhow;
use serde_json::json;

use crate::{
    api::{payroll, salary_component},
    auth::middleware::auth_middleware,
    config::Config,
    error::PayrollError,
};

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))?;

    Ok(Governor::new(&cfg))
}

/// Liveness probe
#[utoipa::path(
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({"status": "ok"}))
    ),
    tag = "Health"
)]
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// Salary component and payroll resources, relative to the API prefix.
pub fn resources(cfg: &mut web::ServiceConfig) {
    // Malformed bodies and filters are validation failures
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        PayrollError::validation(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        PayrollError::validation(err.to_string()).into()
    }));

    cfg.service(
        web::scope("/salary-components")
            // /salary-components
            .service(
                web::resource("")
                    .route(web::get().to(salary_component::list_components))
                    .route(web::post().to(salary_component::create_component)),
            )
            // /salary-components/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(salary_component::get_component))
                    .route(web::put().to(salary_component::update_component))
                    .route(web::patch().to(salary_component::update_component))
                    .route(web::delete().to(salary_component::delete_component)),
            ),
    )
    .service(
        web::scope("/payroll")
            // /payroll
            .service(
                web::resource("")
                    .route(web::get().to(payroll::list_payrolls))
                    .route(web::post().to(payroll::create_payroll)),
            )
            // /payroll/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(payroll::get_payroll))
                    .route(web::put().to(payroll::update_payroll))
                    .route(web::patch().to(payroll::update_payroll))
                    .route(web::delete().to(payroll::delete_payroll)),
            )
            // /payroll/{id}/recalculate
            .service(
                web::resource("/{id}/recalculate")
                    .route(web::post().to(payroll::recalculate_payroll)),
            ),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: Arc<Limiter>) {
    // Public routes
    cfg.service(health);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiter) // rate limiting
            .configure(resources),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn test_health_is_public() {
        let app = test::init_service(App::new().service(health)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({"status": "ok"}));
    }

    #[actix_web::test]
    async fn test_api_requires_bearer_token() {
        let state = crate::api::test_support::state().await;
        let app = crate::api::test_support::test_app!(state);

        let req = test::TestRequest::get().uri("/api/payroll").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({"error": "unauthorized", "message": "Missing Authorization header"})
        );

        let req = test::TestRequest::get()
            .uri("/api/salary-components")
            .insert_header(("Authorization", "Token abc"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "Authorization header must be a Bearer token");

        let req = test::TestRequest::get()
            .uri("/api/salary-components")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unauthorized");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid or expired token")
        );
    }

    #[actix_web::test]
    async fn test_non_hr_write_is_forbidden_with_error_body() {
        use crate::api::test_support::{EMPLOYEE, bearer};

        let state = crate::api::test_support::state().await;
        let app = crate::api::test_support::test_app!(state);

        let req = test::TestRequest::delete()
            .uri("/api/payroll/1")
            .insert_header(bearer(EMPLOYEE))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "forbidden");
    }

    #[actix_web::test]
    async fn test_limiter_accepts_zero_rate() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(1000).is_ok());
    }
}
