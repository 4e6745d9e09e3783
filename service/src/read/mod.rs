//! Read entities definitions.

pub mod purchase;
pub mod quote;
