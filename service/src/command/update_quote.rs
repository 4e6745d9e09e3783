//! [`Command`] for updating a [`Quote`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::quote::Terms;
use crate::{
    domain::{quote, Address, Quote},
    infra::{database, Database},
    Service,
};

use super::{create_address, Command, CreateAddress};

/// [`Command`] for updating [`Terms`] of a [`Quote`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug)]
pub struct UpdateQuote {
    /// ID of the [`Quote`] to be updated.
    pub quote_id: quote::Id,

    /// New [`quote::EffectiveDateTime`] of the [`Quote`].
    pub effective_at: Option<quote::EffectiveDateTime>,

    /// New [`Date`] when a previous policy was canceled.
    ///
    /// `Some(None)` clears it.
    pub previously_canceled_on: Option<Option<Date>>,

    /// New indicator whether the insured property is owned.
    pub is_owned: Option<bool>,

    /// New [`Address`] of the insured property, created if doesn't exist.
    pub address: Option<CreateAddress>,
}

impl<Db> Command<UpdateQuote> for Service<Db>
where
    Self: Command<
        CreateAddress,
        Ok = Address,
        Err = Traced<create_address::ExecutionError>,
    >,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Quote>, quote::Id>>,
            Ok = Option<Quote>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Quote, quote::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Quote>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Quote;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateQuote) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateQuote {
            quote_id,
            effective_at,
            previously_canceled_on,
            is_owned,
            address,
        } = cmd;

        let address = match address {
            Some(cmd) => Some(
                self.execute(cmd)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?,
            ),
            None => None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Quote`.
        tx.execute(Lock(By::new(quote_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut quote = tx
            .execute(Select(By::<Option<Quote>, _>::new(quote_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuoteNotExists(quote_id))
            .map_err(tracerr::wrap!())?;

        if let Some(at) = effective_at {
            quote.set_effective_at(at);
        }
        if let Some(on) = previously_canceled_on {
            quote.set_previously_canceled_on(on);
        }
        if let Some(is_owned) = is_owned {
            quote.set_is_owned(is_owned);
        }
        if let Some(address) = address {
            quote.set_address(Some(address));
        }

        tx.execute(Update(quote.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(quote)
    }
}

/// Error of [`UpdateQuote`] [`Command`] execution.
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
    use common::{Date, DateTime};

    use crate::{
        command::{CreateAddress, CreateQuote},
        domain::{
            address::{State, ZipCode},
            quote,
        },
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::{ExecutionError, UpdateQuote};

    fn create(state: State) -> CreateQuote {
        CreateQuote {
            effective_at: DateTime::now().coerce(),
            previously_canceled_on: Date::from_ymd(2021, 9, 1),
            is_owned: false,
            address: Some(CreateAddress {
                zip_code: ZipCode::new(90210).unwrap(),
                state,
            }),
        }
    }

    fn update(quote_id: quote::Id) -> UpdateQuote {
        UpdateQuote {
            quote_id,
            effective_at: None,
            previously_canceled_on: None,
            is_owned: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn updates_pricing_terms() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let created = svc.execute(create(State::Ca)).await.unwrap();
        assert_eq!(created.cost_monthly().unwrap().to_string(), "13.99");

        let updated = svc
            .execute(UpdateQuote {
                previously_canceled_on: Some(None),
                is_owned: Some(true),
                ..update(created.id().clone())
            })
            .await
            .unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.previously_canceled_on(), None);
        assert!(updated.is_owned());
        assert_eq!(updated.cost_monthly().unwrap().to_string(), "9.49");

        let stored = db.quotes().pop().unwrap();
        assert_eq!(stored.cost_monthly().unwrap().to_string(), "9.49");
        assert_eq!(stored.created_at(), created.created_at());
        assert!(db.quote_locks().contains(created.id()));
    }

    #[tokio::test]
    async fn keeps_omitted_terms() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let created = svc.execute(create(State::Ca)).await.unwrap();
        let updated = svc
            .execute(update(created.id().clone()))
            .await
            .unwrap();

        assert_eq!(
            updated.previously_canceled_on(),
            created.previously_canceled_on(),
        );
        assert_eq!(updated.effective_at(), created.effective_at());
        assert_eq!(updated.address(), created.address());
    }

    #[tokio::test]
    async fn moves_to_other_address() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let created = svc.execute(create(State::Ca)).await.unwrap();
        let updated = svc
            .execute(UpdateQuote {
                address: Some(CreateAddress {
                    zip_code: ZipCode::new(10001).unwrap(),
                    state: State::Ny,
                }),
                ..update(created.id().clone())
            })
            .await
            .unwrap();

        assert!(!updated.address().unwrap().has_volcano());
        assert_eq!(updated.cost_monthly().unwrap().to_string(), "11.49");
        assert_eq!(db.addresses().len(), 2);
    }

    #[tokio::test]
    async fn fails_for_unknown_quote() {
        let svc = Service::new(Config::default(), Memory::default());

        let id = quote::Id::new("ZZZZZZZZZZ").unwrap();
        let err = svc.execute(update(id.clone())).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::QuoteNotExists(missing) if *missing == id,
        ));
    }
}
