//! Domain definitions.

pub mod address;
pub mod pricing;
pub mod purchase;
pub mod quote;

pub use self::{address::Address, purchase::Purchase, quote::Quote};
