use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    auth::{valid_username, AuthUser},
    db::{users::{self, ProfileUpdate}, User},
    error::Error,
    include_res, res, AppResult,
};

/// Every field is optional; whatever is left out stays as stored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpdateUserForm {
    avatar: Option<String>,
    name: Option<String>,
    username: Option<String>,
    email: Option<String>,
    bio: Option<String>,
}

impl UpdateUserForm {
    fn into_update(self) -> Result<ProfileUpdate, Error> {
        let username = self.username.map(|u| u.trim().to_lowercase());
        if username.as_deref().is_some_and(|u| !valid_username(u)) {
            return Err(Error::ValidationFailed(
                "Usernames may contain only letters, digits and @/./+/-/_ (150 at most).".to_owned(),
            ));
        }

        let email = self.email.map(|e| e.trim().to_lowercase());
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(Error::ValidationFailed("Enter a valid email address.".to_owned()));
        }

        Ok(ProfileUpdate {
            avatar: self.avatar.and_then(res::non_empty),
            name: self.name.map(res::non_empty),
            username,
            email,
            bio: self.bio.map(res::non_empty),
        })
    }
}

fn render(user: &User, error: Option<&str>) -> Html<String> {
    let body = include_res!(str, "/pages/update_user.html")
        .replace("{error}", &res::error_block(error))
        .replace("{avatar}", &res::attr(&user.avatar))
        .replace("{name}", &res::attr(user.name.as_deref().unwrap_or("")))
        .replace("{username}", &res::attr(&user.username))
        .replace("{email}", &res::attr(&user.email))
        .replace("{bio}", &res::esc(user.bio.as_deref().unwrap_or("")));
    res::layout(Some(user), "Edit profile", &body)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_user_page(AuthUser(user): AuthUser) -> Html<String> {
    render(&user, None)
}

/// Always edits the signed-in user; the form cannot name anyone else.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_user(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Form(form): Form<UpdateUserForm>,
) -> AppResult<Response> {
    let result = match form.into_update() {
        Ok(update) => users::update_profile(&db_pool, &user, update).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(updated) => Ok(Redirect::to(&format!("/user-profile/{}", updated.id)).into_response()),
        Err(Error::ValidationFailed(error)) => Ok(render(&user, Some(&error)).into_response()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_optional_fields_clear_and_missing_ones_keep() {
        let update = UpdateUserForm {
            name: Some("  ".to_owned()),
            username: Some(" Ada ".to_owned()),
            ..Default::default()
        }
        .into_update()
        .unwrap();

        assert_eq!(update.name, Some(None));
        assert_eq!(update.username.as_deref(), Some("ada"));
        assert_eq!(update.bio, None);
        assert_eq!(update.avatar, None);
    }

    #[test]
    fn rejects_malformed_identity_fields() {
        let bad_email = UpdateUserForm { email: Some("nope".to_owned()), ..Default::default() };
        assert!(matches!(bad_email.into_update(), Err(Error::ValidationFailed(_))));

        let bad_username = UpdateUserForm { username: Some("has space".to_owned()), ..Default::default() };
        assert!(matches!(bad_username.into_update(), Err(Error::ValidationFailed(_))));
    }
}
