//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Quote` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTE_NOT_EXISTS` - the `Quote` with the specified ID does not
    ///                        exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "quote",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn quote(
        id: api::quote::Id,
        ctx: &Context,
    ) -> Result<api::Quote, Error> {
        ctx.service()
            .execute(query::quote::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| QuoteError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Quote`s, ordered by their IDs.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            address = ?address,
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "quotes",
            last = ?last,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn quotes(
        first: Option<i32>,
        after: Option<api::quote::list::Cursor>,
        last: Option<i32>,
        before: Option<api::quote::list::Cursor>,
        address: Option<api::address::Id>,
        ctx: &Context,
    ) -> Result<api::quote::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: i32 = 10;

        let arguments = read::quote::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = read::quote::list::Filter {
            address_id: address.map(Into::into),
        };

        ctx.service()
            .execute(query::quotes::List::by(read::quote::list::Selector {
                arguments,
                filter,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::quote::list::Connection::new(page, filter))
    }

    /// Returns the `Purchase` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PURCHASE_NOT_EXISTS` - the `Purchase` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "purchase",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn purchase(
        id: api::purchase::Id,
        ctx: &Context,
    ) -> Result<api::Purchase, Error> {
        ctx.service()
            .execute(query::purchase::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PurchaseError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Purchase`s, ordered by their IDs.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "purchases",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            quote = ?quote,
        ),
    )]
    pub async fn purchases(
        first: Option<i32>,
        after: Option<api::purchase::list::Cursor>,
        last: Option<i32>,
        before: Option<api::purchase::list::Cursor>,
        quote: Option<api::quote::Id>,
        ctx: &Context,
    ) -> Result<api::purchase::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: i32 = 10;

        let arguments = read::purchase::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = read::purchase::list::Filter {
            quote_id: quote.map(Into::into),
        };

        ctx.service()
            .execute(query::purchases::List::by(
                read::purchase::list::Selector {
                    arguments,
                    filter: filter.clone(),
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::purchase::list::Connection::new(page, filter))
    }
}

define_error! {
    enum QuoteError {
        #[code = "QUOTE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Quote` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PurchaseError {
        #[code = "PURCHASE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Purchase` with the specified ID does not exist"]
        NotExists,
    }
}
