//! JSON bodies exchanged with the Generative Language API.
//!
//! Every response field the backend may omit is modelled as `Option` or as a
//! collection that defaults to empty, so a sparse payload still deserializes.

pub mod gemini;
pub mod imagen;

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a list that may itself be `null` or hold `null` entries; those
/// entries are dropped.
pub(crate) fn non_null_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries.into_iter().flatten().collect())
}
