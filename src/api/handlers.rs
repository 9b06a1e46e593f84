// HTTP request handlers for API endpoints

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie},
    http::header,
    web, HttpRequest, HttpResponse,
};
use tracing::{error, info, warn};

use crate::api::auth::AuthedUser;
use crate::api::models::*;
use crate::api::server::AppState;
use crate::auth::{google, TOKEN_COOKIE, TOKEN_TTL_SECS};
use crate::error::ApiError;
use crate::list;
use crate::scrape::{IndexFilter, ListingResult};
use crate::search::{self, SearchError};

const STATE_COOKIE: &str = "oauth_state";

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&state.db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
    })
}

/// Resolve a free-text query and extract every matching detail page.
///
/// A page that fails extraction is skipped, not batch-fatal; the request only
/// errors when nothing could be produced at all.
pub async fn search_game(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let query = path.into_inner();
    if query.trim().is_empty() {
        return Err(ApiError::EmptyQuery);
    }

    let links = search::resolve(&state.http, &state.search, &query)
        .await
        .map_err(|e| match e {
            SearchError::NoResults => ApiError::NoResults,
            SearchError::Request(e) => ApiError::Other(e.into()),
        })?;

    let results = extract_each(&state, links.iter().map(|l| (l.clone(), IndexFilter::All))).await;
    if results.is_empty() {
        return Err(ApiError::NoResults);
    }

    info!(query = %query, listings = results.len(), "search completed");
    Ok(HttpResponse::Ok().json(results))
}

/// Caller's saved list: rows grouped per game, one extraction per game with
/// the saved positions as the purchase-option filter.
pub async fn list_games(
    user: AuthedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let rows = list::rows_for(&state.db, &user.0.email).await?;
    let groups = list::group_by_game(&rows);

    let targets = groups
        .into_iter()
        .map(|(game_id, indices)| (list::detail_page_url(game_id), IndexFilter::Only(indices)));
    let results = extract_each(&state, targets).await;

    Ok(HttpResponse::Ok().json(results))
}

pub async fn list_add(
    user: AuthedUser,
    path: web::Path<(i64, i32)>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let (game_id, purchase_index) = path.into_inner();
    match list::add(&state.db, &user.0.email, game_id, purchase_index).await {
        Ok(inserted) => {
            info!(email = %user.0.email, game_id, purchase_index, inserted, "list add");
            HttpResponse::Ok().json(OkResponse { ok: true })
        }
        Err(e) => {
            error!(error = %e, "list add failed");
            HttpResponse::InternalServerError().json(OkResponse { ok: false })
        }
    }
}

pub async fn list_remove(
    user: AuthedUser,
    path: web::Path<(i64, i32)>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let (game_id, purchase_index) = path.into_inner();
    match list::remove(&state.db, &user.0.email, game_id, purchase_index).await {
        // Ok regardless of how many rows matched.
        Ok(removed) => {
            info!(email = %user.0.email, game_id, purchase_index, removed, "list remove");
            HttpResponse::Ok().json(OkResponse { ok: true })
        }
        Err(e) => {
            error!(error = %e, "list remove failed");
            HttpResponse::InternalServerError().json(OkResponse { ok: false })
        }
    }
}

/// Current authentication state, straight from the token cookie.
pub async fn auth_status(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match req.cookie(TOKEN_COOKIE) {
        Some(cookie) if state.keys.verify(cookie.value()).is_ok() => {
            HttpResponse::Ok().json(AuthStatus::authenticated(cookie.value().to_string()))
        }
        _ => HttpResponse::Ok().json(AuthStatus::anonymous()),
    }
}

/// Kick off the OAuth consent flow with a CSRF state cookie.
pub async fn login_google(state: web::Data<AppState>) -> HttpResponse {
    let csrf = uuid::Uuid::new_v4().to_string();
    let url = google::authorize_url(&state.oauth, &csrf);

    let state_cookie = Cookie::build(STATE_COOKIE, csrf)
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::minutes(10))
        .finish();

    HttpResponse::Found()
        .cookie(state_cookie)
        .append_header((header::LOCATION, url))
        .finish()
}

/// OAuth redirect target: verify state, trade the code for an identity, set
/// the token cookie and send the user home.
pub async fn google_callback(
    req: HttpRequest,
    query: web::Query<OAuthCallback>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let expected = req
        .cookie(STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::Unauthenticated)?;
    if expected != query.state {
        warn!("oauth state mismatch");
        return Err(ApiError::TokenInvalid);
    }

    let user = google::exchange_code(&state.http, &state.oauth, &query.code).await?;
    let token = state.keys.issue(&user.email, &user.name, &user.photo)?;

    let token_cookie = Cookie::build(TOKEN_COOKIE, token)
        // Readable by the frontend, matching the original contract.
        .http_only(false)
        .path("/")
        .max_age(CookieDuration::seconds(TOKEN_TTL_SECS))
        .finish();
    let clear_state = Cookie::build(STATE_COOKIE, "")
        .path("/")
        .max_age(CookieDuration::ZERO)
        .finish();

    Ok(HttpResponse::Found()
        .cookie(token_cookie)
        .cookie(clear_state)
        .append_header((header::LOCATION, "/"))
        .finish())
}

/// Drop the token cookie. With the cookie as the only identity store there is
/// no further state to destroy.
pub async fn logout() -> HttpResponse {
    let clear = Cookie::build(TOKEN_COOKIE, "")
        .path("/")
        .max_age(CookieDuration::ZERO)
        .finish();

    HttpResponse::Found()
        .cookie(clear)
        .append_header((header::LOCATION, "/"))
        .finish()
}

// Sequentially awaited extractions with per-item isolation.
async fn extract_each(
    state: &AppState,
    targets: impl Iterator<Item = (String, IndexFilter)>,
) -> Vec<ListingResult> {
    let mut results = Vec::new();
    for (url, filter) in targets {
        match state.scraper.extract(&url, &filter).await {
            Ok(listing) => results.push(listing),
            Err(e) => warn!(url = %url, error = %e, "listing extraction failed; skipping"),
        }
    }
    results
}
