//! Postgres database client definitions.
//!
//! Both clients acquire their [`connection`] lazily, on the first statement.
//!
//! [`connection`]: super::connection

pub mod non_tx;
pub mod tx;

pub use self::{non_tx::NonTx, tx::Tx};
