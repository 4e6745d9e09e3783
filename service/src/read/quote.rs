//! [`Quote`]-related read definitions.

#[cfg(doc)]
use crate::domain::Quote;

pub mod list {
    //! [`Quote`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{address, quote};
    #[cfg(doc)]
    use crate::domain::{Address, Quote};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = quote::Id;

    /// Cursor pointing to a specific [`Quote`] in a list.
    pub type Cursor = quote::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`Address`] the listed [`Quote`]s should refer to.
        pub address_id: Option<address::Id>,
    }

    /// Total count of [`Quote`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
