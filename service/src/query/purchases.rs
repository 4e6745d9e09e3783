//! [`Query`] collection related to the multiple [`Purchase`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Purchase, Query};

use super::DatabaseQuery;

/// Queries a list of [`Purchase`]s.
pub type List = DatabaseQuery<
    By<read::purchase::list::Page, read::purchase::list::Selector>,
>;

/// Queries total count of [`Purchase`] list items.
pub type TotalCount = DatabaseQuery<
    By<read::purchase::list::TotalCount, read::purchase::list::Filter>,
>;
