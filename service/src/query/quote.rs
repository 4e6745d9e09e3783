//! [`Query`] collection related to a single [`Quote`].

use common::operations::By;

use crate::domain::{quote, Quote};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Quote`] by its [`quote::Id`].
pub type ById = DatabaseQuery<By<Option<Quote>, quote::Id>>;
