//! [`Quote`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// An insurance policy quote.
#[derive(Clone, Debug)]
pub struct Quote {
    /// ID of this [`Quote`].
    id: Id,

    /// Underlying [`domain::Quote`].
    quote: OnceCell<domain::Quote>,
}

impl From<domain::Quote> for Quote {
    fn from(quote: domain::Quote) -> Self {
        Self {
            id: quote.id().clone().into(),
            quote: OnceCell::new_with(Some(quote)),
        }
    }
}

impl Quote {
    /// Creates a new [`Quote`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Quote`] with the provided ID exists,
    /// otherwise accessing this [`Quote`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            quote: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Quote`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Quote`] doesn't exist.
    async fn quote(&self, ctx: &Context) -> Result<&domain::Quote, Error> {
        let id = self.id.clone().into();
        self.quote
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::quote::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|q| {
                        future::ready(q.ok_or_else(|| {
                            api::query::QuoteError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// An insurance policy quote.
///
/// Costs and breakdowns are calculated from the current attributes of the
/// `Quote` and are never stored.
#[graphql_object(context = Context)]
impl Quote {
    /// Unique identifier of this `Quote`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// `DateTime` when the policy of this `Quote` comes into effect.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.dateEffective",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn date_effective(
        &self,
        ctx: &Context,
    ) -> Result<DateTime, Error> {
        Ok(self.quote(ctx).await?.effective_at().coerce())
    }

    /// `Date` when a previous policy of the insured was canceled, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.datePreviousCanceled",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn date_previous_canceled(
        &self,
        ctx: &Context,
    ) -> Result<Option<Date>, Error> {
        Ok(self.quote(ctx).await?.previously_canceled_on())
    }

    /// Indicator whether the insured property is owned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.isOwned",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_owned(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.quote(ctx).await?.is_owned())
    }

    /// `Address` of the insured property.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.address",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn address(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Address>, Error> {
        Ok(self.quote(ctx).await?.address().cloned().map(Into::into))
    }

    /// Monthly cost of the policy.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.costMonthly",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn cost_monthly(&self, ctx: &Context) -> Result<Money, Error> {
        self.quote(ctx)
            .await?
            .cost_monthly()
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Biannual cost of the policy.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.costBiannually",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn cost_biannually(
        &self,
        ctx: &Context,
    ) -> Result<Money, Error> {
        self.quote(ctx)
            .await?
            .cost_biannually()
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Fees and discounts of the monthly cost.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.breakdownMonthly",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn breakdown_monthly(
        &self,
        ctx: &Context,
    ) -> Result<api::pricing::Breakdown, Error> {
        self.quote(ctx)
            .await?
            .breakdown_monthly()
            .map(|b| b.clone().into())
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Fees and discounts of the biannual cost.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.breakdownBiannually",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn breakdown_biannually(
        &self,
        ctx: &Context,
    ) -> Result<api::pricing::Breakdown, Error> {
        self.quote(ctx)
            .await?
            .breakdown_biannually()
            .map(|b| b.clone().into())
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// `DateTime` when this `Quote` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quote.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.quote(ctx).await?.created_at().coerce())
    }
}

/// Unique identifier of a `Quote`.
///
/// Consists of 10 characters out of `A-Z` and `0-9`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "QuoteId", with = scalar::Via::<domain::quote::Id>)]
pub struct Id(domain::quote::Id);

impl AsError for domain::quote::MissingAddress {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

pub mod list {
    //! Definitions related to the [`Quote`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Id, Quote};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Quote` list.
    #[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::quote::list::Cursor)]
    #[graphql(
        name = "QuoteListCursor",
        with = scalar::Via::<read::quote::list::Cursor>,
    )]
    pub struct Cursor(pub read::quote::list::Cursor);

    /// Edge in the [`Quote`] list.
    #[derive(Clone, Debug, From, Into)]
    pub struct Edge(read::quote::list::Edge);

    /// Edge in the `Quote` list.
    #[graphql_object(name = "QuoteListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `QuoteListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.clone().into()
        }

        /// Node of this `QuoteListEdge`.
        #[must_use]
        pub fn node(&self) -> Quote {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Quote` \
                          existence"
            )]
            unsafe {
                Quote::new_unchecked(self.0.node.clone())
            }
        }
    }

    /// Connection of the [`Quote`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::quote::list::Connection`].
        page: read::quote::list::Connection,

        /// [`read::quote::list::Filter`] the [`Connection`] is selected by.
        filter: read::quote::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the provided `page` selected
        /// by the provided `filter`.
        #[must_use]
        pub fn new(
            page: read::quote::list::Connection,
            filter: read::quote::list::Filter,
        ) -> Self {
            Self { page, filter }
        }
    }

    /// Connection of the `Quote` list.
    #[graphql_object(name = "QuoteListConnection", context = Context)]
    impl Connection {
        /// Edges of this `QuoteListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page.edges.iter().cloned().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.page.page_info(),
                filter: self.filter,
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::quote::list::PageInfo`].
        info: read::quote::list::PageInfo,

        /// [`read::quote::list::Filter`] the page is selected by.
        filter: read::quote::list::Filter,
    }

    /// Information about a `QuoteListConnection` page.
    #[graphql_object(name = "QuoteListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.info.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.info.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> Option<Cursor> {
            self.info.start_cursor.clone().map(Into::into)
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> Option<Cursor> {
            self.info.end_cursor.clone().map(Into::into)
        }

        /// Total count of the `Quote`s matching the list filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::quotes::TotalCount::by(self.filter))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
