//! [`Command`] definition.

pub mod create_address;
pub mod create_purchase;
pub mod create_quote;
pub mod delete_purchase;
pub mod delete_quote;
pub mod update_quote;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_address::CreateAddress, create_purchase::CreatePurchase,
    create_quote::CreateQuote, delete_purchase::DeletePurchase,
    delete_quote::DeleteQuote, update_quote::UpdateQuote,
};
