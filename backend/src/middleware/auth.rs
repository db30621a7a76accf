use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState, utils::jwt::verify_access_token};

/// Identity of the verified caller, attached to request extensions for
/// downstream handlers. Only the user id is carried; whether the user record
/// still exists is the handler's concern.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
}

/// Gates protected routes on a bearer access token.
///
/// A missing or unparsable `Authorization` header is 401; a header that is
/// present but fails verification (bad signature, expired, malformed) is 403.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or(AppError::MissingCredentials)?;

    let claims = verify_access_token(token, &state.config.access_token_secret)
        .ok_or(AppError::InvalidCredentials)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
    });

    Ok(next.run(request).await)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        let token = rest.trim_start();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}
