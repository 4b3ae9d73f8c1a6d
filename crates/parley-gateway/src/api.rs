use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use parley_shared::constants::{IMAGES_FIELD, INFERENCE_API_PATH, TEXT_FIELD};
use parley_shared::protocol::ResultBody;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::imaging;
use crate::rate_limit::{throttle_middleware, Throttle};
use crate::upstream::{ContentPart, UpstreamClient};

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub throttle: Throttle,
    pub config: Arc<GatewayConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(INFERENCE_API_PATH, post(infer))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(middleware::from_fn_with_state(
            state.throttle.clone(),
            throttle_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The single inference route: multipart `text` + repeated `images`,
/// answered with `{"result": ...}` or `{"error": ...}`.
async fn infer(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResultBody>, GatewayError> {
    let mut text = String::new();
    let mut images: Vec<Vec<u8>> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(field_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            TEXT_FIELD => {
                text = field.text().await.map_err(field_error)?;
            }
            IMAGES_FIELD => {
                let data = field.bytes().await.map_err(field_error)?;
                images.push(data.to_vec());
            }
            _ => {}
        }
    }

    if text.is_empty() && images.is_empty() {
        return Err(GatewayError::EmptySubmission);
    }

    info!(
        text_len = text.len(),
        image_count = images.len(),
        "Inference request received"
    );

    let parts = build_content_parts(text, &images)?;
    let result = state.upstream.complete(parts).await?;
    Ok(Json(ResultBody { result }))
}

/// A tripped body limit surfaces while reading fields; keep its 413 instead
/// of flattening everything to a 400.
fn field_error(e: MultipartError) -> GatewayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge
    } else {
        GatewayError::BadRequest(format!("Multipart error: {e}"))
    }
}

/// Assemble the upstream message content: the text part first (only when
/// non-empty), then one data-URL image part per upload, in upload order.
fn build_content_parts(
    text: String,
    images: &[Vec<u8>],
) -> Result<Vec<ContentPart>, GatewayError> {
    let mut parts = Vec::with_capacity(images.len() + 1);
    if !text.is_empty() {
        parts.push(ContentPart::text(text));
    }
    for data in images {
        let jpeg = imaging::thumbnail_jpeg(data)?;
        parts.push(ContentPart::image(imaging::to_data_url(&jpeg)));
    }
    Ok(parts)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting inference gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        router_with_config(GatewayConfig::default())
    }

    fn router_with_config(config: GatewayConfig) -> Router {
        let state = AppState {
            upstream: Arc::new(UpstreamClient::new(&config)),
            throttle: Throttle::default(),
            config: Arc::new(config),
        };
        build_router(state)
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        use image::codecs::png::PngEncoder;
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 20, 30]),
        ));
        let mut buf = Vec::new();
        img.write_with_encoder(PngEncoder::new(&mut buf)).unwrap();
        buf
    }

    /// Decode an image part's data URL back to pixel dimensions.
    fn part_dimensions(part: &ContentPart) -> (u32, u32) {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine as _;
        use image::GenericImageView;

        let ContentPart::ImageUrl { image_url } = part else {
            panic!("expected an image part, got {part:?}");
        };
        let b64 = image_url
            .url
            .strip_prefix("data:image/jpeg;base64,")
            .expect("image part should carry a jpeg data URL");
        let jpeg = BASE64.decode(b64).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        (decoded.width(), decoded.height())
    }

    fn multipart_request(fields: &[(&str, &str)]) -> Request<Body> {
        let boundary = "parley-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::post(INFERENCE_API_PATH)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_empty_submission_rejected() {
        let response = test_router()
            .oneshot(multipart_request(&[("text", "")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["error"],
            "No input provided. Please submit text or images."
        );
    }

    #[tokio::test]
    async fn test_unknown_fields_ignored() {
        // A submission with only an unrecognized field is still empty.
        let response = test_router()
            .oneshot(multipart_request(&[("metadata", "x")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_content_parts_text_first_then_images_in_upload_order() {
        let images = vec![png_bytes(100, 50), png_bytes(40, 80)];
        let parts = build_content_parts("hello".to_string(), &images).unwrap();

        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], ContentPart::Text { text } if text == "hello"));
        assert_eq!(part_dimensions(&parts[1]), (100, 50));
        assert_eq!(part_dimensions(&parts[2]), (40, 80));
    }

    #[test]
    fn test_content_parts_images_only_skips_text_part() {
        let images = vec![png_bytes(10, 10)];
        let parts = build_content_parts(String::new(), &images).unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(part_dimensions(&parts[0]), (10, 10));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_with_413() {
        let mut config = GatewayConfig::default();
        config.max_upload_size = 256;
        let router = router_with_config(config);

        let big = "x".repeat(4 * 1024);
        let response = router
            .oneshot(multipart_request(&[("text", big.as_str())]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Request body too large");
    }

    #[tokio::test]
    async fn test_undecodable_image_is_server_error() {
        let response = test_router()
            .oneshot(multipart_request(&[("images", "not-an-image")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Error resizing image:"));
    }
}
