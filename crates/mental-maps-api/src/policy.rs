//! Who may see and change what.
//!
//! Moderators bypass ownership for reads and writes. Public maps are
//! readable by any authenticated caller.

use mental_maps_types::models::{Map, Visibility};

use crate::error::ApiError;
use crate::middleware::Caller;

pub fn can_read(caller: &Caller, map: &Map) -> bool {
    map.visibility == Visibility::Public || caller.is_moderator() || caller.id == map.owner_id
}

pub fn can_write(caller: &Caller, map: &Map) -> bool {
    caller.is_moderator() || caller.id == map.owner_id
}

pub fn require_moderator(caller: &Caller) -> Result<(), ApiError> {
    if caller.is_moderator() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Insufficient permissions: moderator role required",
        ))
    }
}
