//! User-owned category tags.

use serde::{Deserialize, Serialize};

/// A colored category label owned by a user.
///
/// Tag names are unique per owner. An event may reference any number of
/// tags; the first association drives its display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Hex color value, e.g. `#3b82f6`.
    pub color: String,
    pub user_id: String,
}
