use tower_sessions::Session;

pub const USER_ID: &str = "user_id";
pub const FLASH: &str = "flash";

pub async fn set_flash(session: &Session, message: &str) -> Result<(), tower_sessions::session::Error> {
    session.insert(FLASH, message).await
}

/// One-shot: reading the flash clears it.
pub async fn take_flash(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    session.remove(FLASH).await
}
