// Item definitions

use crate::types::{Gp, ItemId};

/// An immutable item entry: identity, display name, and vendor value.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub sells_for: Gp,
}

impl ItemDef {
    pub fn new(id: ItemId, name: impl Into<String>, sells_for: Gp) -> Self {
        Self {
            id,
            name: name.into(),
            sells_for,
        }
    }
}
