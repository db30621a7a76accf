//! Sign-up, sign-in, refresh rotation, and sign-out.
//!
//! Refresh tokens are rotated on every use: a refresh consumes the presented
//! session row and issues a replacement, so a previously consumed token is
//! indistinguishable from an invalid one.

use axum::{
    extract::State,
    http::{header, header::USER_AGENT, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, FieldErrors},
    models::{
        session::Session,
        user::{RefreshResponse, SignInRequest, SignInResponse, SignUpRequest, User, UserEnvelope},
    },
    repositories::{session as session_repo, user as user_repo},
    state::AppState,
    utils::{
        cookies::{
            build_clear_cookie, build_refresh_cookie, extract_cookie_value, REFRESH_COOKIE_NAME,
        },
        jwt::{create_access_token, create_refresh_token, verify_refresh_token},
        password::{hash_password, verify_password},
    },
    validation::rules::validate_name,
};

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), AppError> {
    payload.validate()?;
    ensure_name_not_blank(&payload.name)?;

    if user_repo::find_user_by_email(&state.pool, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::email_taken());
    }

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(payload.name, payload.email, password_hash);
    user_repo::insert_user(&state.pool, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope { user: user.into() }),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SignInRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    // Unknown email and wrong password take the same exit so the response
    // never reveals which one it was.
    let user = user_repo::find_user_by_email(&state.pool, &payload.email)
        .await?
        .ok_or(AppError::InvalidSignIn)?;
    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidSignIn);
    }

    let (session, refresh_token) = issue_session(&state, &user.id, &headers)?;
    session_repo::insert_session(&state.pool, &session).await?;

    let access_token = create_access_token(
        &user.id,
        &state.config.access_token_secret,
        state.config.access_token_expiration_minutes,
    )?;

    let body = SignInResponse {
        user: user.into(),
        access_token,
    };
    let mut response = (StatusCode::OK, Json(body)).into_response();
    set_refresh_cookie(&mut response, &state, &refresh_token)?;
    Ok(response)
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = refresh_cookie(&headers).ok_or(AppError::Unauthorized("Refresh token missing"))?;

    let claims = verify_refresh_token(&token, &state.config.refresh_token_secret)
        .ok_or(AppError::Forbidden("Invalid refresh token"))?;

    let session = session_repo::find_session_by_id(&state.pool, &claims.sid).await?;
    let now = Utc::now();
    let session = match session {
        Some(session)
            if session.refresh_token == token
                && !session.revoked
                && !session.is_expired(now) =>
        {
            session
        }
        Some(stale) => {
            // The row exists but the token no longer matches it, it was
            // revoked, or it expired. Drop the row so a tampered or replayed
            // token cannot be retried against it.
            session_repo::delete_session(&state.pool, &stale.id).await?;
            return Err(AppError::Forbidden("Invalid or expired session"));
        }
        None => return Err(AppError::Forbidden("Invalid or expired session")),
    };

    let (replacement, new_refresh_token) = issue_session(&state, &claims.sub, &headers)?;
    session_repo::rotate_session(&state.pool, &session.id, &replacement).await?;

    let access_token = create_access_token(
        &claims.sub,
        &state.config.access_token_secret,
        state.config.access_token_expiration_minutes,
    )?;

    let mut response = (StatusCode::OK, Json(RefreshResponse { access_token })).into_response();
    set_refresh_cookie(&mut response, &state, &new_refresh_token)?;
    Ok(response)
}

/// Best-effort logout. A missing or unverifiable token still succeeds; the
/// caller is already as signed out as we can make them. The matching session
/// is revoked rather than deleted to keep an audit trail.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = refresh_cookie(&headers) {
        match verify_refresh_token(&token, &state.config.refresh_token_secret) {
            Some(claims) => {
                if let Err(err) = session_repo::revoke_session(&state.pool, &claims.sid).await {
                    tracing::warn!(error = ?err, "Failed to revoke session during sign-out");
                }
            }
            None => {
                tracing::warn!("Sign-out presented an unverifiable refresh token");
            }
        }
    }

    let mut response = (
        StatusCode::OK,
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&build_clear_cookie(state.config.cookie_options())) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Mints a session id, the refresh token bound to it, and the session row to
/// persist; shared by sign-in and refresh.
fn issue_session(
    state: &AppState,
    user_id: &str,
    headers: &HeaderMap,
) -> Result<(Session, String), AppError> {
    let session_id = Uuid::new_v4().to_string();
    let refresh_token = create_refresh_token(
        user_id,
        &session_id,
        &state.config.refresh_token_secret,
        state.config.refresh_token_expiration_days,
    )?;
    let expires_at = Utc::now() + Duration::days(state.config.refresh_token_expiration_days as i64);
    let session = Session::new(
        session_id,
        user_id.to_string(),
        refresh_token.clone(),
        expires_at,
        extract_user_agent(headers),
        extract_ip(headers),
    );
    Ok((session, refresh_token))
}

fn set_refresh_cookie(
    response: &mut Response,
    state: &AppState,
    refresh_token: &str,
) -> Result<(), AppError> {
    let cookie = build_refresh_cookie(
        refresh_token,
        state.config.refresh_token_ttl(),
        state.config.cookie_options(),
    );
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid cookie header: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| extract_cookie_value(raw, REFRESH_COOKIE_NAME))
}

fn ensure_name_not_blank(name: &str) -> Result<(), AppError> {
    if let Err(err) = validate_name(name) {
        let message = err
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string());
        let mut errors = FieldErrors::new();
        errors.insert("name".into(), vec![message]);
        return Err(AppError::Validation(errors));
    }
    Ok(())
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|agent| agent.trim().to_string())
        .filter(|agent| !agent.is_empty())
}

fn extract_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        return value
            .split(',')
            .next()
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}
