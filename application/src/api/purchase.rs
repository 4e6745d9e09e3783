//! [`Purchase`]-related definitions.

use std::future;

use common::{DateTime, Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A purchased insurance policy.
///
/// Amounts are frozen at the moment of purchase and never change afterwards.
#[derive(Clone, Debug)]
pub struct Purchase {
    /// ID of this [`Purchase`].
    id: Id,

    /// Underlying [`domain::Purchase`].
    purchase: OnceCell<domain::Purchase>,
}

impl From<domain::Purchase> for Purchase {
    fn from(purchase: domain::Purchase) -> Self {
        Self {
            id: purchase.id.into(),
            purchase: OnceCell::new_with(Some(purchase)),
        }
    }
}

impl Purchase {
    /// Creates a new [`Purchase`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Purchase`] with the provided ID exists,
    /// otherwise accessing this [`Purchase`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            purchase: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Purchase`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Purchase`] doesn't exist.
    async fn purchase(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Purchase, Error> {
        let id = self.id.into();
        self.purchase
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::purchase::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|p| {
                        future::ready(p.ok_or_else(|| {
                            api::query::PurchaseError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Returns the frozen [`domain::purchase::Snapshot`] of this
    /// [`Purchase`].
    async fn snapshot(
        &self,
        ctx: &Context,
    ) -> Result<domain::purchase::Snapshot, Error> {
        Ok(self.purchase(ctx).await?.snapshot)
    }
}

/// A purchased insurance policy.
///
/// Amounts are frozen at the moment of purchase and never change afterwards.
#[graphql_object(context = Context)]
impl Purchase {
    /// Unique identifier of this `Purchase`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Quote` this `Purchase` was made from.
    ///
    /// `null` once the `Quote` is deleted.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.quote",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn quote(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Quote>, Error> {
        Ok(self.purchase(ctx).await?.quote_id.clone().map(|id| {
            #[expect(
                unsafe_code,
                reason = "`Quote` deletion unlinks it from every `Purchase`"
            )]
            unsafe {
                api::Quote::new_unchecked(id)
            }
        }))
    }

    /// Billing cadence of this `Purchase`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.paymentFrequency",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_frequency(
        &self,
        ctx: &Context,
    ) -> Result<api::PaymentFrequency, Error> {
        Ok(self.snapshot(ctx).await?.payment_frequency.into())
    }

    /// Amount paid per billing period.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.paymentAmount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_amount(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.snapshot(ctx).await?.payment_amount)
    }

    /// Discount for having no previously canceled policy.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.discountCanceledAmt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn discount_canceled_amt(
        &self,
        ctx: &Context,
    ) -> Result<Money, Error> {
        Ok(self.snapshot(ctx).await?.discount_canceled_amt)
    }

    /// Discount for owning the insured property.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.discountOwnsPropertyAmt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn discount_owns_property_amt(
        &self,
        ctx: &Context,
    ) -> Result<Money, Error> {
        Ok(self.snapshot(ctx).await?.discount_owns_property_amt)
    }

    /// Fee for having a previously canceled policy.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.feeCanceledAmt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn fee_canceled_amt(
        &self,
        ctx: &Context,
    ) -> Result<Money, Error> {
        Ok(self.snapshot(ctx).await?.fee_canceled_amt)
    }

    /// Fee for the insured property located in a state with volcanic
    /// activity.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.feeStateAmt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn fee_state_amt(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.snapshot(ctx).await?.fee_state_amt)
    }

    /// `DateTime` when this `Purchase` was made.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Purchase.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.purchase(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Purchase`.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "PurchaseId", with = scalar::Via::<domain::purchase::Id>)]
pub struct Id(domain::purchase::Id);

pub mod list {
    //! Definitions related to the [`Purchase`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Id, Purchase};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Purchase` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::purchase::list::Cursor)]
    #[graphql(
        name = "PurchaseListCursor",
        with = scalar::Via::<read::purchase::list::Cursor>,
    )]
    pub struct Cursor(pub read::purchase::list::Cursor);

    /// Edge in the [`Purchase`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::purchase::list::Edge);

    /// Edge in the `Purchase` list.
    #[graphql_object(name = "PurchaseListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `PurchaseListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `PurchaseListEdge`.
        #[must_use]
        pub fn node(&self) -> Purchase {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees \
                          `Purchase` existence"
            )]
            unsafe {
                Purchase::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Purchase`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::purchase::list::Connection`].
        page: read::purchase::list::Connection,

        /// [`read::purchase::list::Filter`] the [`Connection`] is selected
        /// by.
        filter: read::purchase::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the provided `page` selected
        /// by the provided `filter`.
        #[must_use]
        pub fn new(
            page: read::purchase::list::Connection,
            filter: read::purchase::list::Filter,
        ) -> Self {
            Self { page, filter }
        }
    }

    /// Connection of the `Purchase` list.
    #[graphql_object(name = "PurchaseListConnection", context = Context)]
    impl Connection {
        /// Edges of this `PurchaseListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.page.page_info(),
                filter: self.filter.clone(),
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::purchase::list::PageInfo`].
        info: read::purchase::list::PageInfo,

        /// [`read::purchase::list::Filter`] the page is selected by.
        filter: read::purchase::list::Filter,
    }

    /// Information about a `PurchaseListConnection` page.
    #[graphql_object(name = "PurchaseListPageInfo", context = Context)]
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
            self.info.start_cursor.map(Into::into)
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> Option<Cursor> {
            self.info.end_cursor.map(Into::into)
        }

        /// Total count of the `Purchase`s matching the list filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::purchases::TotalCount::by(self.filter.clone()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
