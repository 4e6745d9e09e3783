//! GraphQL [`Mutation`]s definitions.

use common::{Date, DateTime};
use juniper::{graphql_object, Nullable};
use service::{command, Command as _};

use crate::{
    api::{
        self,
        query::{PurchaseError, QuoteError},
    },
    AsError, Context, Error,
};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Quote` with the provided attributes.
    ///
    /// `Quote` ID is always generated by the server. There is no argument to
    /// provide it, so a request passing one fails validation.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ADDRESS_STATE_INVALID` - provided `AddressInput.state` is not a US
    ///                             state or `DC`;
    /// - `ADDRESS_STATE_MISSING` - `AddressInput.state` is not provided;
    /// - `ADDRESS_ZIPCODE_INVALID` - provided `AddressInput.zipcode` is out
    ///                               of range.
    #[tracing::instrument(
        skip_all,
        fields(
            address = ?address,
            date_effective = ?date_effective,
            date_previous_canceled = ?date_previous_canceled,
            gql.name = "createQuote",
            is_owned = %is_owned,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_quote(
        date_effective: DateTime,
        date_previous_canceled: Option<Date>,
        is_owned: bool,
        address: Option<api::address::Input>,
        ctx: &Context,
    ) -> Result<api::Quote, Error> {
        let address = address
            .map(command::CreateAddress::try_from)
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateQuote {
                effective_at: date_effective.coerce(),
                previously_canceled_on: date_previous_canceled,
                is_owned,
                address,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided attributes of the `Quote` with the specified ID.
    ///
    /// Omitted attributes keep their current values, while explicit `null`
    /// clears `datePreviousCanceled`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTE_NOT_EXISTS` - the `Quote` with the specified ID does not
    ///                        exist;
    /// - `ADDRESS_STATE_INVALID` - provided `AddressInput.state` is not a US
    ///                             state or `DC`;
    /// - `ADDRESS_STATE_MISSING` - `AddressInput.state` is not provided;
    /// - `ADDRESS_ZIPCODE_INVALID` - provided `AddressInput.zipcode` is out
    ///                               of range.
    #[tracing::instrument(
        skip_all,
        fields(
            address = ?address,
            date_effective = ?date_effective,
            date_previous_canceled = ?date_previous_canceled,
            gql.name = "updateQuote",
            id = %id,
            is_owned = ?is_owned,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_quote(
        id: api::quote::Id,
        date_effective: Option<DateTime>,
        date_previous_canceled: Nullable<Date>,
        is_owned: Option<bool>,
        address: Option<api::address::Input>,
        ctx: &Context,
    ) -> Result<api::Quote, Error> {
        let address = address
            .map(command::CreateAddress::try_from)
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateQuote {
                quote_id: id.into(),
                effective_at: date_effective.map(DateTime::coerce),
                previously_canceled_on: date_previous_canceled.explicit(),
                is_owned,
                address,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Quote` with the specified ID.
    ///
    /// `Purchase`s made from the `Quote` are kept, but lose their link to it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTE_NOT_EXISTS` - the `Quote` with the specified ID does not
    ///                        exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteQuote",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_quote(
        id: api::quote::Id,
        ctx: &Context,
    ) -> Result<api::Quote, Error> {
        ctx.service()
            .execute(command::DeleteQuote { quote_id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Purchases the `Quote` with the specified ID billed with the provided
    /// `PaymentFrequency`.
    ///
    /// Cost and breakdown of the `Quote` are frozen into the `Purchase`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTE_NOT_EXISTS` - the `Quote` with the specified ID does not
    ///                        exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createPurchase",
            payment_frequency = ?payment_frequency,
            quote = %quote,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_purchase(
        quote: api::quote::Id,
        payment_frequency: api::PaymentFrequency,
        ctx: &Context,
    ) -> Result<api::Purchase, Error> {
        ctx.service()
            .execute(command::CreatePurchase {
                quote_id: quote.into(),
                payment_frequency: payment_frequency.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Purchase` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PURCHASE_NOT_EXISTS` - the `Purchase` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deletePurchase",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_purchase(
        id: api::purchase::Id,
        ctx: &Context,
    ) -> Result<api::Purchase, Error> {
        ctx.service()
            .execute(command::DeletePurchase {
                purchase_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for command::create_quote::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::IdsExhausted(_) => None,
        }
    }
}

impl AsError for command::update_quote::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::QuoteNotExists(_) => Some(QuoteError::NotExists.into()),
        }
    }
}

impl AsError for command::delete_quote::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::QuoteNotExists(_) => Some(QuoteError::NotExists.into()),
        }
    }
}

impl AsError for command::create_purchase::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotPriceable(e) => e.try_as_error(),
            Self::QuoteNotExists(_) => Some(QuoteError::NotExists.into()),
        }
    }
}

impl AsError for command::delete_purchase::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PurchaseNotExists(_) => Some(PurchaseError::NotExists.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::api::{Mutation, Query, Schema, Subscription};

    #[test]
    fn create_quote_has_no_id_argument() {
        let schema = Schema::new(Query, Mutation, Subscription::new());

        let field = schema
            .schema
            .concrete_type_by_name("Mutation")
            .and_then(|t| t.field_by_name("createQuote"))
            .unwrap();
        let args = field
            .arguments
            .iter()
            .flatten()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>();

        assert!(args.contains(&"dateEffective"));
        assert!(!args.iter().any(|a| a.eq_ignore_ascii_case("id")));
        assert!(!args.iter().any(|a| a.eq_ignore_ascii_case("qid")));
    }
}
