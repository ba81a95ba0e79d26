mod page;
mod update;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user-profile/{id}", get(page::profile))
        .route("/update-user", get(update::update_user_page).post(update::update_user))
}
