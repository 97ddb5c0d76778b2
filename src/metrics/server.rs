use actix_web::{web, App, HttpResponse, HttpServer};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use super::Metrics;

/// Serve `/metrics` and `/health` until the surrounding actix system stops.
/// Run it on its own thread with `actix_web::rt::System`.
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    let data = web::Data::from(metrics);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .workers(1)
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(render_metrics))
        .route("/health", web::get().to(health));
}

async fn render_metrics(metrics: web::Data<Metrics>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let mut body = Vec::new();

    match encoder.encode(&metrics.registry().gather(), &mut body) {
        Ok(()) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn health(metrics: web::Data<Metrics>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "order-pulse",
        "subscribers": metrics.connected_subscribers.get(),
        "ordersCreated": metrics.orders_created.get(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, test};

    async fn get(metrics: Arc<Metrics>, uri: &str) -> (bool, String) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(metrics))
                .configure(routes),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let ok = resp.status().is_success();
        let body = to_bytes(resp.into_body()).await.unwrap();
        (ok, String::from_utf8(body.to_vec()).unwrap())
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_renders_text_format() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.orders_created.inc();

        let (ok, text) = get(metrics, "/metrics").await;
        assert!(ok);
        assert!(text.contains("orders_created_total 1"));
        assert!(text.contains("hub_connected_subscribers 0"));
    }

    #[actix_web::test]
    async fn test_health_reports_live_counts() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.connected_subscribers.set(3);
        metrics.orders_created.inc_by(2);

        let (ok, body) = get(metrics, "/health").await;
        assert!(ok);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["service"], "order-pulse");
        assert_eq!(json["subscribers"], 3);
        assert_eq!(json["ordersCreated"], 2);
    }
}
