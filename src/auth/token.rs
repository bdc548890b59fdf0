//! Defines the token struct used in the auth cookies.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::{Role, UserID, datetime_format};

/// A token for authorization and authentication.
///
/// The token travels inside an encrypted and signed private cookie, so the
/// role claim cannot be tampered with by the client.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Token {
    /// The signed-in user.
    pub user_id: UserID,

    /// The signed-in user's role.
    pub role: Role,

    /// When the token stops being valid.
    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}
