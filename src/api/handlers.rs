use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use http::header;

use crate::api::models::{ErrorResponse, GetUserByPhoneRequest, GetUserByPhoneResponse};
use crate::auth::{Claims, JwtService};
use crate::error::{ErrorCode, TagbookError};
use crate::notify::Notifier;
use crate::ocr::ReceiptExtractor;
use crate::service::{AuthContext, TagbookService};
use crate::storage::Storage;

pub struct AppState<S: Storage, N: Notifier, X: ReceiptExtractor> {
    pub service: TagbookService<S, N, X>,
    pub jwt: JwtService,
}

struct ApiError(TagbookError);

impl From<TagbookError> for ApiError {
    fn from(e: TagbookError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = match code {
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse { code, message: self.0.to_string() });
        (status, body).into_response()
    }
}

async fn auth_middleware<S: Storage + 'static, N: Notifier + 'static, X: ReceiptExtractor + 'static>(
    State(state): State<Arc<AppState<S, N, X>>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| TagbookError::Unauthenticated("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| TagbookError::Unauthenticated("Invalid Authorization header".to_string()))?;

    let claims = state.jwt.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn api_routes<S: Storage + 'static, N: Notifier + 'static, X: ReceiptExtractor + 'static>(
    state: Arc<AppState<S, N, X>>,
) -> Router {
    Router::new()
        .route("/users/by-phone", axum::routing::post(get_user_by_phone))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

async fn get_user_by_phone<S: Storage, N: Notifier, X: ReceiptExtractor>(
    State(state): State<Arc<AppState<S, N, X>>>,
    axum::Extension(claims): axum::Extension<Claims>,
    Json(request): Json<GetUserByPhoneRequest>,
) -> Result<Json<GetUserByPhoneResponse>, ApiError> {
    let auth = AuthContext {
        uid: claims.sub,
        phone_number: claims.phone,
    };
    let user = state
        .service
        .get_user_by_phone(&auth, &request.phone_number)
        .await?;
    Ok(Json(GetUserByPhoneResponse { success: true, user }))
}
