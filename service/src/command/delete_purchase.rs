//! [`Command`] for deleting a [`Purchase`].

use common::operations::{By, Commit, Delete, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{purchase, Purchase},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Purchase`].
#[derive(Clone, Copy, Debug, From)]
pub struct DeletePurchase {
    /// ID of the [`Purchase`] to be deleted.
    pub purchase_id: purchase::Id,
}

impl<Db> Command<DeletePurchase> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Purchase>, purchase::Id>>,
            Ok = Option<Purchase>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Purchase, purchase::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Purchase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeletePurchase,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeletePurchase { purchase_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let purchase = tx
            .execute(Select(By::<Option<Purchase>, _>::new(purchase_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PurchaseNotExists(purchase_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::new(purchase.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(purchase)
    }
}

/// Error of [`DeletePurchase`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Purchase`] doesn't exist.
    #[display("`Purchase(id: {_0})` does not exist")]
    #[from(ignore)]
    PurchaseNotExists(#[error(not(source))] purchase::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::{CreateAddress, CreatePurchase, CreateQuote},
        domain::{
            address::{State, ZipCode},
            pricing::Cadence,
            purchase,
        },
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::{DeletePurchase, ExecutionError};

    #[tokio::test]
    async fn deletes_purchase_but_keeps_quote() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc
            .execute(CreateQuote {
                effective_at: DateTime::now().coerce(),
                previously_canceled_on: None,
                is_owned: false,
                address: Some(CreateAddress {
                    zip_code: ZipCode::new(84101).unwrap(),
                    state: State::Ut,
                }),
            })
            .await
            .unwrap();
        let purchase = svc
            .execute(CreatePurchase {
                quote_id: quote.id().clone(),
                payment_frequency: Cadence::Monthly,
            })
            .await
            .unwrap();

        let deleted = svc
            .execute(DeletePurchase::from(purchase.id))
            .await
            .unwrap();

        assert_eq!(deleted.id, purchase.id);
        assert!(db.purchases().is_empty());
        assert_eq!(db.quotes().len(), 1);
    }

    #[tokio::test]
    async fn fails_for_unknown_purchase() {
        let svc = Service::new(Config::default(), Memory::default());

        let err = svc
            .execute(DeletePurchase::from(purchase::Id::from(42)))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PurchaseNotExists(id) if i64::from(*id) == 42,
        ));
    }
}
