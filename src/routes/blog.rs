//! Post and category routes.

use crate::handlers::{
    create_category, create_post, delete_category, delete_post, edit_post, get_category, get_post, list_categories,
    list_posts,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn blog_routes(state: AppState) -> Router {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(edit_post).patch(edit_post).delete(delete_post),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", get(get_category).delete(delete_category))
        .with_state(state)
}
