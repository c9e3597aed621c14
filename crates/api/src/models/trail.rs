//! Trail records and their request bodies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use trails_core::{LocationId, TrailId, TrailLogId};

use super::{InvalidField, require_text};

/// The client-writable fields of a trail.
///
/// Used directly as the body of `POST /trails`. The identifier is assigned
/// by the store, so a `TrailID` in the body is rejected as an unknown field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrailDetails {
    #[serde(rename = "TrailName")]
    pub name: String,
    #[serde(
        rename = "TrailRating",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub rating: Option<Decimal>,
    #[serde(rename = "TrailDifficulty")]
    pub difficulty: String,
    #[serde(rename = "TrailDistance", with = "rust_decimal::serde::float")]
    pub distance: Decimal,
    #[serde(rename = "TrailEstTime")]
    pub est_time: String,
    #[serde(rename = "TrailRouteType")]
    pub route_type: String,
    #[serde(rename = "TrailDescription")]
    pub description: String,
    #[serde(rename = "LocationID")]
    pub location_id: LocationId,
}

impl TrailDetails {
    pub const MAX_NAME: usize = 100;
    /// Difficulty, estimated time and route type share the same column width.
    pub const MAX_SHORT: usize = 10;
    pub const MAX_DESCRIPTION: usize = 10_000;

    /// `NUMERIC(5,2)`
    const DISTANCE_SCALE: u32 = 2;
    /// `NUMERIC(5,3)`
    const RATING_SCALE: u32 = 3;

    /// Round numeric fields to their column scale and check every field.
    ///
    /// # Errors
    ///
    /// Returns the first field that is blank, too long or out of range.
    pub fn normalized(mut self) -> Result<Self, InvalidField> {
        require_text("TrailName", &self.name, Self::MAX_NAME)?;
        require_text("TrailDifficulty", &self.difficulty, Self::MAX_SHORT)?;
        require_text("TrailEstTime", &self.est_time, Self::MAX_SHORT)?;
        require_text("TrailRouteType", &self.route_type, Self::MAX_SHORT)?;
        require_text(
            "TrailDescription",
            &self.description,
            Self::MAX_DESCRIPTION,
        )?;

        self.distance = self.distance.round_dp(Self::DISTANCE_SCALE);
        if self.distance <= Decimal::ZERO || self.distance > Decimal::new(99_999, 2) {
            return Err(InvalidField::new(
                "TrailDistance",
                "must be greater than 0 and at most 999.99",
            ));
        }

        if let Some(rating) = self.rating {
            let rating = rating.round_dp(Self::RATING_SCALE);
            if rating < Decimal::ZERO || rating > Decimal::new(99_999, 3) {
                return Err(InvalidField::new(
                    "TrailRating",
                    "must be between 0 and 99.999",
                ));
            }
            self.rating = Some(rating);
        }

        Ok(self)
    }
}

/// A stored trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trail {
    #[serde(rename = "TrailID")]
    pub id: TrailId,
    #[serde(flatten)]
    pub details: TrailDetails,
}

/// Body of `PUT /trails/{id}`.
///
/// Every field is optional and absent fields keep their stored value.
/// `TrailRating` may be set to `null` to clear it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrailPatch {
    #[serde(rename = "TrailName")]
    pub name: Option<String>,
    #[serde(rename = "TrailRating", default, deserialize_with = "nullable_float")]
    pub rating: Option<Option<Decimal>>,
    #[serde(rename = "TrailDifficulty")]
    pub difficulty: Option<String>,
    #[serde(
        rename = "TrailDistance",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub distance: Option<Decimal>,
    #[serde(rename = "TrailEstTime")]
    pub est_time: Option<String>,
    #[serde(rename = "TrailRouteType")]
    pub route_type: Option<String>,
    #[serde(rename = "TrailDescription")]
    pub description: Option<String>,
    #[serde(rename = "LocationID")]
    pub location_id: Option<LocationId>,
}

// Distinguishes an explicit `null` (clear) from an absent key (keep).
fn nullable_float<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: Deserializer<'de>,
{
    rust_decimal::serde::float_option::deserialize(deserializer).map(Some)
}

impl TrailPatch {
    /// True when the body names no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.rating.is_none()
            && self.difficulty.is_none()
            && self.distance.is_none()
            && self.est_time.is_none()
            && self.route_type.is_none()
            && self.description.is_none()
            && self.location_id.is_none()
    }

    /// Merge onto the stored fields. The result still needs
    /// [`TrailDetails::normalized`].
    #[must_use]
    pub fn apply(self, mut details: TrailDetails) -> TrailDetails {
        if let Some(name) = self.name {
            details.name = name;
        }
        if let Some(rating) = self.rating {
            details.rating = rating;
        }
        if let Some(difficulty) = self.difficulty {
            details.difficulty = difficulty;
        }
        if let Some(distance) = self.distance {
            details.distance = distance;
        }
        if let Some(est_time) = self.est_time {
            details.est_time = est_time;
        }
        if let Some(route_type) = self.route_type {
            details.route_type = route_type;
        }
        if let Some(description) = self.description {
            details.description = description;
        }
        if let Some(location_id) = self.location_id {
            details.location_id = location_id;
        }
        details
    }
}

/// Audit record written when a trail is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailLogEntry {
    #[serde(rename = "LogID")]
    pub id: TrailLogId,
    #[serde(rename = "TrailID")]
    pub trail_id: TrailId,
    #[serde(rename = "AddedBy")]
    pub added_by: String,
    #[serde(rename = "AddedOn")]
    pub added_on: DateTime<Utc>,
}
