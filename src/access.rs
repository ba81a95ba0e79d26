//! Ownership rules: only a room's host may change it, only a message's author
//! may delete it.

use uuid::Uuid;

use crate::{
    db::User,
    error::{Error, Result},
};

pub const UPDATE_ROOM: &str = "Only update rooms that are your own!";
pub const DELETE_ROOM: &str = "Only delete rooms that are your own!";
pub const DELETE_MESSAGE: &str = "Only delete messages that are your own!";

/// Compares ids, never references: the actor is reloaded on every request.
/// A record without an owner (host account gone) belongs to nobody.
pub fn ensure_owner(actor: &User, owner: Option<Uuid>, rejection: &'static str) -> Result<()> {
    if owner == Some(actor.id) {
        return Ok(());
    }

    tracing::warn!(actor = %actor.id, owner = ?owner, "{rejection}");
    Err(Error::Forbidden(rejection))
}
