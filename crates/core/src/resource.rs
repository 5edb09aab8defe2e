//! Resource configuration.
//!
//! Every backend collection the console manages is described by a
//! [`ResourceConfig`]: which backend generation serves it, where its
//! endpoints live, how new items are placed, and which form schema guards
//! writes. The console's generic collection is instantiated once per
//! [`Entity`] and reads everything else from this data.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::types::EntityId;
use crate::validation::{FieldRule, ValidationErrors};

/// Backend generation addressed by a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// `/api/admin/...`, bearer token + tenant key + actor id headers.
    Legacy,
    /// `/v1/...`, bearer token only.
    V2,
}

/// Where a newly created item lands in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Prepend,
    Append,
}

/// Endpoint templates for one resource.
///
/// `{id}` and `{field}` are substituted by [`Endpoints::expand`].
#[derive(Debug, Clone, Copy)]
pub struct Endpoints {
    pub list: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
    /// Boolean flip endpoint; `None` when the resource has no toggles.
    pub toggle: Option<&'static str>,
}

impl Endpoints {
    /// Conventional REST layout rooted at `base`.
    #[must_use]
    pub const fn rest(base: &'static str, update: &'static str, toggle: Option<&'static str>) -> Self {
        Self {
            list: base,
            create: base,
            update,
            delete: update,
            toggle,
        }
    }

    /// Substitute `{id}` and `{field}` placeholders in a template.
    ///
    /// Each value must stay a single path segment, so it may only hold
    /// ASCII letters, digits and `-_.~:@`, and never `..`.
    ///
    /// # Errors
    ///
    /// Returns [`UnsafeSegment`] naming the offending placeholder.
    pub fn expand(
        template: &str,
        id: Option<&EntityId>,
        field: Option<&str>,
    ) -> Result<String, UnsafeSegment> {
        let mut path = template.to_string();
        if let Some(id) = id {
            path = path.replace("{id}", segment("id", id.as_str())?);
        }
        if let Some(field) = field {
            path = path.replace("{field}", segment("field", field)?);
        }
        Ok(path)
    }
}

/// An id or field that would not stay inside its own path segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{placeholder} is not a valid path segment")]
pub struct UnsafeSegment {
    pub placeholder: &'static str,
}

impl From<UnsafeSegment> for ValidationErrors {
    fn from(err: UnsafeSegment) -> Self {
        Self::single(err.placeholder, "contains characters not allowed in an identifier")
    }
}

fn segment<'a>(placeholder: &'static str, value: &'a str) -> Result<&'a str, UnsafeSegment> {
    let allowed = |byte: u8| byte.is_ascii_alphanumeric() || b"-_.~:@".contains(&byte);
    if value.is_empty() || value.contains("..") || !value.bytes().all(allowed) {
        return Err(UnsafeSegment { placeholder });
    }
    Ok(value)
}

/// Static description of one backend collection.
#[derive(Debug, Clone, Copy)]
pub struct ResourceConfig {
    /// Route segment the console mounts the resource under (`coin-plans`).
    pub name: &'static str,
    /// Human label used in notifications (`Coin plan`).
    pub label: &'static str,
    /// Permission section governing sub-admin access.
    pub section: &'static str,
    pub backend: Backend,
    pub endpoints: Endpoints,
    pub insert: InsertPosition,
    /// List-only resources expose no create/update/delete/toggle.
    pub read_only: bool,
    /// Form schema checked before create and update.
    pub schema: &'static [FieldRule],
}

/// A backend entity managed by a resource collection.
///
/// Implementations are usually generated by `impl_entity!`, which wires the
/// identifier and the named boolean flags used by toggle operations.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Configuration of the collection this entity belongs to.
    const RESOURCE: ResourceConfig;

    /// Wire names of the booleans a toggle may flip.
    const FLAGS: &'static [&'static str];

    /// Backend-issued identifier, unique within a list.
    fn id(&self) -> &EntityId;

    /// Read a toggleable boolean by its wire name.
    fn flag(&self, field: &str) -> Option<bool>;

    /// Mutable access to a toggleable boolean by its wire name.
    fn flag_mut(&mut self, field: &str) -> Option<&mut bool>;
}

/// Implement [`Entity`] for a struct with an `id: EntityId` field.
///
/// ```rust
/// # use chimax_core::{impl_entity, EntityId, Backend, Endpoints, InsertPosition, ResourceConfig, Entity};
/// # use serde::{Deserialize, Serialize};
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Sticker {
///     #[serde(rename = "_id")]
///     id: EntityId,
///     #[serde(rename = "isActive", default)]
///     is_active: bool,
/// }
///
/// const STICKERS: ResourceConfig = ResourceConfig {
///     name: "stickers",
///     label: "Sticker",
///     section: "stickers",
///     backend: Backend::Legacy,
///     endpoints: Endpoints::rest("/api/admin/sticker", "/api/admin/sticker/{id}", None),
///     insert: InsertPosition::Prepend,
///     read_only: false,
///     schema: &[],
/// };
///
/// impl_entity!(Sticker, STICKERS, flags: [is_active => "isActive"]);
///
/// let mut sticker = Sticker { id: EntityId::new("s1"), is_active: false };
/// *sticker.flag_mut("isActive").unwrap() = true;
/// assert_eq!(sticker.flag("isActive"), Some(true));
/// assert_eq!(sticker.flag("missing"), None);
/// assert_eq!(Sticker::FLAGS, ["isActive"]);
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty, $config:expr $(, flags: [$($flag:ident => $wire:literal),* $(,)?])?) => {
        impl $crate::resource::Entity for $ty {
            const RESOURCE: $crate::resource::ResourceConfig = $config;
            const FLAGS: &'static [&'static str] = &[$($($wire),*)?];

            fn id(&self) -> &$crate::types::EntityId {
                &self.id
            }

            #[allow(clippy::match_single_binding)]
            fn flag(&self, field: &str) -> Option<bool> {
                match field {
                    $($($wire => Some(self.$flag),)*)?
                    _ => None,
                }
            }

            #[allow(clippy::match_single_binding)]
            fn flag_mut(&mut self, field: &str) -> Option<&mut bool> {
                match field {
                    $($($wire => Some(&mut self.$flag),)*)?
                    _ => None,
                }
            }
        }
    };
}
