//! [`Command`] for creating a new [`Purchase`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        pricing::Cadence,
        purchase::{self, Snapshot},
        quote::{self, MissingAddress},
        Purchase, Quote,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for purchasing a [`Quote`] billed with the provided
/// [`Cadence`].
///
/// Pricing of the [`Quote`] is frozen into the created [`Purchase`], so any
/// later change of the [`Quote`] doesn't affect it.
#[derive(Clone, Debug)]
pub struct CreatePurchase {
    /// ID of the [`Quote`] to be purchased.
    pub quote_id: quote::Id,

    /// [`Cadence`] the policy is billed with.
    pub payment_frequency: Cadence,
}

impl<Db> Command<CreatePurchase> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Quote>, quote::Id>>,
            Ok = Option<Quote>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Quote, quote::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Insert<purchase::New>,
            Ok = Purchase,
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Purchase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreatePurchase,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePurchase {
            quote_id,
            payment_frequency,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid the `Quote` being changed while its pricing is frozen.
        tx.execute(Lock(By::new(quote_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let quote = tx
            .execute(Select(By::<Option<Quote>, _>::new(quote_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuoteNotExists(quote_id))
            .map_err(tracerr::wrap!())?;

        let snapshot = Snapshot::freeze(&quote, payment_frequency)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let purchase = tx
            .execute(Insert(purchase::New {
                quote_id: quote.id().clone(),
                snapshot,
                created_at: DateTime::now().coerce(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(purchase)
    }
}

/// Error of [`CreatePurchase`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Quote`] cannot be priced.
    #[display("`Quote` cannot be priced: {_0}")]
    NotPriceable(MissingAddress),

    /// [`Quote`] doesn't exist.
    #[display("`Quote(id: {_0})` does not exist")]
    #[from(ignore)]
    QuoteNotExists(#[error(not(source))] quote::Id),
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime, Money};
    use rust_decimal_macros::dec;

    use crate::{
        command::{CreateAddress, CreateQuote, DeleteQuote, UpdateQuote},
        domain::{
            address::{State, ZipCode},
            pricing::Cadence,
            quote,
        },
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::{CreatePurchase, ExecutionError};

    fn create_quote(address: Option<CreateAddress>) -> CreateQuote {
        CreateQuote {
            effective_at: DateTime::now().coerce(),
            previously_canceled_on: Date::from_ymd(2021, 9, 1),
            is_owned: false,
            address,
        }
    }

    fn volcanic() -> Option<CreateAddress> {
        Some(CreateAddress {
            zip_code: ZipCode::new(97201).unwrap(),
            state: State::Or,
        })
    }

    #[tokio::test]
    async fn freezes_quote_pricing() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc.execute(create_quote(volcanic())).await.unwrap();
        let purchase = svc
            .execute(CreatePurchase {
                quote_id: quote.id().clone(),
                payment_frequency: Cadence::Monthly,
            })
            .await
            .unwrap();

        assert_eq!(purchase.quote_id.as_ref(), Some(quote.id()));
        assert_eq!(purchase.snapshot.payment_frequency, Cadence::Monthly);
        assert_eq!(purchase.snapshot.payment_amount.to_string(), "13.99");
        assert_eq!(
            purchase.snapshot.fee_canceled_amt,
            Money::new(dec!(1.4985)),
        );
        assert_eq!(purchase.snapshot.fee_state_amt, Money::new(dec!(2.4975)));
        assert_eq!(purchase.snapshot.discount_canceled_amt, Money::ZERO);
        assert_eq!(purchase.snapshot.discount_owns_property_amt, Money::ZERO);
        assert_eq!(db.purchases().len(), 1);
    }

    #[tokio::test]
    async fn is_isolated_from_quote_changes() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc.execute(create_quote(volcanic())).await.unwrap();
        let purchase = svc
            .execute(CreatePurchase {
                quote_id: quote.id().clone(),
                payment_frequency: Cadence::Biannually,
            })
            .await
            .unwrap();
        assert_eq!(purchase.snapshot.payment_amount.to_string(), "83.92");

        let _ = svc
            .execute(UpdateQuote {
                quote_id: quote.id().clone(),
                effective_at: None,
                previously_canceled_on: Some(None),
                is_owned: Some(true),
                address: None,
            })
            .await
            .unwrap();
        let stored = db.purchases().pop().unwrap();
        assert_eq!(stored.snapshot, purchase.snapshot);

        let _ = svc
            .execute(DeleteQuote::from(quote.id().clone()))
            .await
            .unwrap();
        let stored = db.purchases().pop().unwrap();
        assert_eq!(stored.quote_id, None);
        assert_eq!(stored.snapshot, purchase.snapshot);
    }

    #[tokio::test]
    async fn fails_for_unknown_quote() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let err = svc
            .execute(CreatePurchase {
                quote_id: quote::Id::new("NOTAQUOTE0").unwrap(),
                payment_frequency: Cadence::Monthly,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::QuoteNotExists(_)));
        assert!(db.purchases().is_empty());
    }

    #[tokio::test]
    async fn fails_for_quote_without_address() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc.execute(create_quote(None)).await.unwrap();
        let err = svc
            .execute(CreatePurchase {
                quote_id: quote.id().clone(),
                payment_frequency: Cadence::Monthly,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotPriceable(_)));
        assert!(db.purchases().is_empty());
    }
}
