//! [`Purchase`]-related read definitions.

#[cfg(doc)]
use crate::domain::Purchase;

pub mod list {
    //! [`Purchase`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{purchase, quote};
    #[cfg(doc)]
    use crate::domain::{Purchase, Quote};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = purchase::Id;

    /// Cursor pointing to a specific [`Purchase`] in a list.
    pub type Cursor = purchase::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// ID of the [`Quote`] the listed [`Purchase`]s should refer to.
        pub quote_id: Option<quote::Id>,
    }

    /// Total count of [`Purchase`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
