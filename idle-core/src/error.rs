//! Error taxonomy for the engine, shop, and planner.
//!
//! The tick engine records resource exhaustion in `Changes` rather than
//! erroring; these errors surface from the fail-fast interaction layer, the
//! persistence boundary, and planner termination. `UnknownId` is the only
//! kind that indicates a corrupt save and is treated as fatal by hosts.

use crate::types::{ActionId, ItemId, PurchaseId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// An action cannot consume its required inputs.
    #[error("inputs missing for action {action:?}: need {count} of item {item:?}")]
    InputsMissing {
        action: ActionId,
        item: ItemId,
        count: u32,
    },

    /// A new item type cannot be placed in the inventory.
    #[error("inventory full: no slot for item {item:?}")]
    InventoryFull { item: ItemId },

    /// A mining node has no remaining resource.
    #[error("node depleted for action {action:?}")]
    NodeDepleted { action: ActionId },

    /// The purchase has reached its buy limit.
    #[error("buy limit exceeded for purchase {purchase:?}")]
    BuyLimitExceeded { purchase: PurchaseId },

    /// Unlock requirements (skill level, purchase gates) are not met.
    #[error("requirements unmet: {what}")]
    RequirementsUnmet { what: String },

    /// Not enough gp for a purchase.
    #[error("insufficient gp: have {have}, need {need}")]
    InsufficientGp { have: u64, need: u64 },

    /// A registry lookup missed. Indicates a corrupt save; fatal.
    #[error("unknown id: {name}")]
    UnknownId { name: String },

    /// The active action cannot be switched while stunned.
    #[error("cannot switch activity while stunned")]
    Stunned,

    /// Planner exhausted its node or wall-time budget.
    #[error("planner budget exceeded after {nodes} nodes")]
    BudgetExceeded { nodes: usize },

    /// No interaction and no positive wait delta can advance the search.
    #[error("planner dead end: no progress possible toward the goal")]
    DeadEnd,
}
