use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::user::UserEnvelope,
    repositories::user as user_repo,
    state::AppState,
};

/// Current user behind the bearer token. The token can outlive the record,
/// so a vanished user is a 404 here, not a middleware concern.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = user_repo::find_user_by_id(&state.pool, &auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserEnvelope { user: user.into() }))
}

/// Lookup by id. Callers may only read their own record; broader
/// authorization policies belong to the layers above this service.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<UserEnvelope>, AppError> {
    if user_id != auth.user_id {
        return Err(AppError::Forbidden("Forbidden"));
    }

    let user = user_repo::find_user_by_id(&state.pool, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserEnvelope { user: user.into() }))
}
