//! [`Command`] for deleting a [`Quote`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Purchase;
use crate::{
    domain::{quote, Quote},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Quote`].
///
/// [`Purchase`]s of the deleted [`Quote`] are kept, losing their reference to
/// it.
#[derive(Clone, Debug, From)]
pub struct DeleteQuote {
    /// ID of the [`Quote`] to be deleted.
    pub quote_id: quote::Id,
}

impl<Db> Command<DeleteQuote> for Service<Db>
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
            Delete<By<Quote, quote::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Quote;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteQuote) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteQuote { quote_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Quote`.
        tx.execute(Lock(By::new(quote_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let quote = tx
            .execute(Select(By::<Option<Quote>, _>::new(quote_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuoteNotExists(quote_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::new(quote.id().clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(quote)
    }
}

/// Error of [`DeleteQuote`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Quote`] doesn't exist.
    #[display("`Quote(id: {_0})` does not exist")]
    #[from(ignore)]
    QuoteNotExists(#[error(not(source))] quote::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::{CreateAddress, CreateQuote},
        domain::{
            address::{State, ZipCode},
            quote,
        },
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::{DeleteQuote, ExecutionError};

    #[tokio::test]
    async fn deletes_quote_but_keeps_address() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc
            .execute(CreateQuote {
                effective_at: DateTime::now().coerce(),
                previously_canceled_on: None,
                is_owned: true,
                address: Some(CreateAddress {
                    zip_code: ZipCode::new(96813).unwrap(),
                    state: State::Hi,
                }),
            })
            .await
            .unwrap();

        let deleted = svc
            .execute(DeleteQuote::from(quote.id().clone()))
            .await
            .unwrap();

        assert_eq!(deleted.id(), quote.id());
        assert!(db.quotes().is_empty());
        assert!(db.quote_locks().is_empty());
        assert_eq!(db.addresses().len(), 1);

        let err = svc
            .execute(DeleteQuote::from(quote.id().clone()))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::QuoteNotExists(_)));
    }

    #[tokio::test]
    async fn fails_for_unknown_quote() {
        let svc = Service::new(Config::default(), Memory::default());

        let err = svc
            .execute(DeleteQuote::from(quote::Id::new("0000000000").unwrap()))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::QuoteNotExists(_)));
    }
}
