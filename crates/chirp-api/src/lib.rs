pub mod auth;
pub mod bookmarks;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod password;
pub mod profiles;
pub mod relationships;
pub mod session;
pub mod tweets;
pub mod validation;

mod rows;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use chirp_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// Build the full HTTP surface. Layers such as tracing and CORS are added by
/// the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/profile/signup", post(auth::sign_up))
        .route("/profile/signin", post(auth::sign_in))
        .route("/profile", get(profiles::get_profile))
        .route("/profile/avatar", get(profiles::get_avatar))
        .route("/profile/tweets", get(tweets::list_tweets))
        .route("/tweets/{id}", get(tweets::get_tweet))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/profile/signout", post(auth::sign_out))
        .route(
            "/profile/me",
            get(profiles::current_profile).patch(profiles::edit_profile),
        )
        .route(
            "/profile/me/avatar",
            put(profiles::upload_avatar).layer(DefaultBodyLimit::max(state.max_avatar_bytes)),
        )
        .route("/profile/follow", post(profiles::follow))
        .route("/profile/unfollow", post(profiles::unfollow))
        .route(
            "/profile/bookmarks",
            get(bookmarks::list_bookmarks)
                .post(bookmarks::add_bookmark)
                .delete(bookmarks::remove_bookmark),
        )
        .route("/tweets", post(tweets::create_tweet))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run blocking store work off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db)).await?
}
