//! GraphQL API definitions.

pub mod address;
mod mutation;
pub mod pricing;
pub mod purchase;
mod query;
pub mod quote;
pub mod scalar;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    address::Address, mutation::Mutation, pricing::PaymentFrequency,
    purchase::Purchase, query::Query, quote::Quote,
};

/// GraphQL subscription root.
///
/// There are no subscriptions in the API.
pub type Subscription = EmptySubscription<Context>;

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}
