//! Newtype IDs for backend-issued identifiers.
//!
//! The backend hands out opaque string identifiers (`_id` on the wire). The
//! `define_id!` macro wraps them so ids of different kinds cannot be mixed.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use chimax_core::define_id;
/// define_id!(HostId);
/// define_id!(AgencyId);
///
/// let host = HostId::new("65f0c1");
/// let agency = AgencyId::new("65f0c1");
///
/// // Same text, different types:
/// // let _: HostId = agency;
/// assert_eq!(host.as_str(), agency.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the identifier text.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Identifier of any entity inside a resource collection.
define_id!(EntityId);
// Identifier of the signed-in admin or sub-admin (the `uid` storage key).
define_id!(AdminId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_is_transparent_on_the_wire() {
        let id: EntityId = serde_json::from_str("\"h1\"").unwrap_or_else(|_| EntityId::new(""));
        assert_eq!(id.as_str(), "h1");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"h1\""));
    }

    #[test]
    fn test_display_matches_inner_text() {
        let id = AdminId::from("admin-7");
        assert_eq!(id.to_string(), "admin-7");
        assert_eq!(id.into_inner(), "admin-7");
    }
}
