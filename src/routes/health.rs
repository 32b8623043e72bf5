use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::db::DbPool;

/// Health check endpoint
///
/// Reports whether the database answers, with the current timestamp.
#[get("/health", name = "health")]
pub async fn health(pool: web::Data<DbPool>) -> impl Responder {
    let database = match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => "ok",
        Err(e) => {
            log::error!("health check failed: {}", e);
            "unavailable"
        }
    };

    let body = json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now()
    });
    if database == "ok" {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use actix_web::test;

    #[actix_web::test]
    async fn test_health_endpoint() {
        let pool = db::connect_in_memory().await.unwrap();
        let app = test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(pool))
                .service(health),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"], "ok");
        assert!(json["timestamp"].is_string());
    }
}
