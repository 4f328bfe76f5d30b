use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
};
use uuid::Uuid;

use crate::{error::AppError, state::SharedState};

pub mod achievement;
pub mod battle;
pub mod docs;
pub mod health;
pub mod scoring;
pub mod sse;

/// Header carrying the acting user, resolved by the out-of-process gateway.
const USER_ID_HEADER: &str = "x-user-id";

/// Acting user extracted from the `X-User-Id` header. Authentication itself
/// happens upstream; the core only needs the resolved identity.
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing user header `X-User-Id`".into()))?;

        let id = Uuid::parse_str(value)
            .map_err(|_| AppError::Unauthorized("invalid user header `X-User-Id`".into()))?;

        Ok(Self(id))
    }
}

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(battle::router())
        .merge(achievement::router())
        .merge(scoring::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
