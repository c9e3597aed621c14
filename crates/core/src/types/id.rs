//! Typed primary keys.
//!
//! Every table keys its rows with a `SERIAL` column. Each gets its own
//! wrapper so a comment id can never be passed where a trail id is expected.

/// Declare one or more `i32` key wrappers.
///
/// Each wrapper serializes as a bare number, displays as one, orders like
/// one, and (with the `postgres` feature) binds as an `INTEGER` column.
///
/// ```rust
/// # use trails_core::entity_ids;
/// entity_ids! {
///     /// A waymark.
///     WaymarkId,
/// }
///
/// assert_eq!(WaymarkId::new(4).to_string(), "4");
/// ```
#[macro_export]
macro_rules! entity_ids {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(raw: i32) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }
    )+};
}

entity_ids! {
    /// Row of `app_user`.
    UserId,
    /// Row of `trail`.
    TrailId,
    /// Row of `comment`.
    CommentId,
    /// Row of `location`.
    LocationId,
    /// Row of `trail_log`.
    TrailLogId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_number() {
        assert_eq!(TrailId::new(42).to_string(), "42");
    }

    #[test]
    fn test_wire_format_is_bare_number() {
        assert_eq!(serde_json::to_string(&CommentId::new(7)).unwrap(), "7");

        let parsed: UserId = serde_json::from_str("9").unwrap();
        assert_eq!(parsed, UserId::new(9));
        assert_eq!(parsed.as_i32(), 9);
    }

    #[test]
    fn test_ordering_follows_the_number() {
        assert!(LocationId::new(2) < LocationId::new(10));
    }
}
