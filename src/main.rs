use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tagbook::api::{AppState, api_routes};
use tagbook::auth::JwtService;
use tagbook::config::CONFIG;
use tagbook::notify::in_memory::InMemoryNotifier;
use tagbook::ocr::remote::AzureVisionExtractor;
use tagbook::ocr::{DisabledExtractor, ReceiptExtractor};
use tagbook::service::TagbookService;
use tagbook::storage::in_memory::InMemoryStorage;

enum Extractor {
    Remote(AzureVisionExtractor),
    Disabled(DisabledExtractor),
}

#[async_trait::async_trait]
impl ReceiptExtractor for Extractor {
    async fn extract(
        &self,
        receipt_url: &str,
    ) -> Result<tagbook::ocr::ReceiptFields, tagbook::TagbookError> {
        match self {
            Extractor::Remote(e) => e.extract(receipt_url).await,
            Extractor::Disabled(e) => e.extract(receipt_url).await,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(CONFIG.log_level.clone())),
        )
        .init();

    let extractor = match (&CONFIG.ocr_endpoint, &CONFIG.ocr_key) {
        (Some(endpoint), Some(key)) => {
            Extractor::Remote(AzureVisionExtractor::new(endpoint.clone(), key.clone()))
        }
        _ => {
            info!("OCR not configured, receipt extraction disabled");
            Extractor::Disabled(DisabledExtractor)
        }
    };

    let service = TagbookService::new(InMemoryStorage::new(), InMemoryNotifier::new(), extractor);
    let state = Arc::new(AppState {
        service,
        jwt: JwtService::new(CONFIG.jwt_secret.clone()),
    });

    let app = api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    info!("tagbookd listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
