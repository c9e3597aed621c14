//! Trail locations.

use serde::{Deserialize, Serialize};

use trails_core::LocationId;

use super::{InvalidField, require_text};

/// A named place trails start from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    #[serde(rename = "LocationID")]
    pub id: LocationId,
    #[serde(rename = "LocationName")]
    pub name: String,
}

/// Body of `POST /locations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewLocation {
    #[serde(rename = "LocationName")]
    pub name: String,
}

impl NewLocation {
    /// Maximum length of a location name.
    pub const MAX_NAME: usize = 100;

    /// Validate against the column limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is blank or too long.
    pub fn validate(&self) -> Result<(), InvalidField> {
        require_text("LocationName", &self.name, Self::MAX_NAME)
    }
}
