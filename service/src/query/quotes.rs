//! [`Query`] collection related to the multiple [`Quote`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Quote, Query};

use super::DatabaseQuery;

/// Queries a list of [`Quote`]s.
pub type List =
    DatabaseQuery<By<read::quote::list::Page, read::quote::list::Selector>>;

/// Queries total count of [`Quote`] list items.
pub type TotalCount = DatabaseQuery<
    By<read::quote::list::TotalCount, read::quote::list::Filter>,
>;
