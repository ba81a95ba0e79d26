use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    db::users::{self, NewUser},
    include_res, res, AppResult,
};

use super::{password, Actor};

/// Shown for every failure so the form never reveals which field (or which
/// existing account) was the problem.
pub(crate) const REGISTRATION_FAILED: &str = "An error occurred during registration.";

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterForm {
    #[serde(default)]
    name: String,
    username: String,
    email: String,
    password1: String,
    password2: String,
    #[serde(default)]
    bio: String,
}

impl RegisterForm {
    async fn into_new_user(self) -> Result<NewUser, &'static str> {
        let username = self.username.trim().to_lowercase();
        let email = self.email.trim().to_lowercase();

        if !valid_username(&username) {
            return Err("invalid username");
        }
        if !email.contains('@') {
            return Err("invalid email");
        }
        if self.password1 != self.password2 {
            return Err("passwords differ");
        }
        if self.password1.chars().count() < MIN_PASSWORD_LEN || self.password1.chars().all(|c| c.is_ascii_digit()) {
            return Err("weak password");
        }

        let password_hash = password::hash_blocking(self.password1)
            .await
            .map_err(|_| "hashing failed")?;
        Ok(NewUser {
            email,
            username,
            name: res::non_empty(self.name),
            bio: res::non_empty(self.bio),
            password_hash,
        })
    }
}

pub(crate) fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= MAX_USERNAME_LEN
        && username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
}

fn render(error: Option<&str>) -> Response {
    let body = include_res!(str, "/pages/register.html")
        .replace("{error}", &res::error_block(error));
    res::layout(None, "Register", &body).into_response()
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register_page(Actor(actor): Actor) -> Response {
    if actor.is_some() {
        return Redirect::to("/").into_response();
    }
    render(None)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let new_user = match form.into_new_user().await {
        Ok(new_user) => new_user,
        Err(reason) => {
            tracing::debug!(reason, "registration rejected");
            return Ok(render(Some(REGISTRATION_FAILED)));
        }
    };

    let user = match users::insert(&db_pool, new_user).await {
        Ok(user) => user,
        Err(e) if e.is_unique_violation() => {
            tracing::debug!("registration rejected: duplicate account");
            return Ok(render(Some(REGISTRATION_FAILED)));
        }
        Err(e) => return Err(e.into()),
    };

    super::login(&session, &user).await?;
    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, p1: &str, p2: &str) -> RegisterForm {
        RegisterForm {
            name: String::new(),
            username: username.to_owned(),
            email: email.to_owned(),
            password1: p1.to_owned(),
            password2: p2.to_owned(),
            bio: String::new(),
        }
    }

    #[tokio::test]
    async fn normalizes_username_and_email() {
        let user = form("  AdaL ", "Ada@X.com", "s3cretpass", "s3cretpass").into_new_user().await.unwrap();
        assert_eq!(user.username, "adal");
        assert_eq!(user.email, "ada@x.com");
        assert_eq!(user.name, None);
        assert!(password::verify("s3cretpass", &user.password_hash));
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        assert!(form("ada", "ada@x.com", "s3cretpass", "s3cretpasz").into_new_user().await.is_err());
        assert!(form("ada", "ada@x.com", "short", "short").into_new_user().await.is_err());
        assert!(form("ada", "ada@x.com", "12345678", "12345678").into_new_user().await.is_err());
        assert!(form("ada", "not-an-email", "s3cretpass", "s3cretpass").into_new_user().await.is_err());
        assert!(form("ada lovelace", "ada@x.com", "s3cretpass", "s3cretpass").into_new_user().await.is_err());
        assert!(form("", "ada@x.com", "s3cretpass", "s3cretpass").into_new_user().await.is_err());
    }

    #[test]
    fn username_charset() {
        assert!(valid_username("ada.l+study_group-1@home"));
        assert!(!valid_username("ada!"));
        assert!(!valid_username(&"a".repeat(151)));
    }
}
