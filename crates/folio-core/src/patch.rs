//! Presence-aware partial updates.
//!
//! A field missing from a patch body leaves the stored value alone; a present
//! field overwrites it, even when it is empty, zero or `false`. Nullable
//! columns are modelled as `Option<Option<T>>` so that an explicit JSON `null`
//! clears the stored value.

use serde::{Deserialize, Deserializer, de::Error as _};
use uuid::Uuid;

/// Deserialise a nullable patch field: absent → `None`, `null` →
/// `Some(None)`, value → `Some(Some(v))`.
///
/// Must be paired with `#[serde(default)]` so that an absent field falls back
/// to `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserialise an identifier that clients send as `""` when the entity has
/// not been persisted yet.
pub fn blank_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<String>::deserialize(deserializer)? {
    None => Ok(None),
    Some(s) if s.trim().is_empty() => Ok(None),
    Some(s) => Uuid::parse_str(s.trim()).map(Some).map_err(D::Error::custom),
  }
}

/// Overwrite `slot` when the patch carries a value. Returns whether the slot
/// was touched.
pub fn apply<T>(slot: &mut T, value: &Option<T>) -> bool
where
  T: Clone,
{
  match value {
    Some(v) => {
      *slot = v.clone();
      true
    }
    None => false,
  }
}
