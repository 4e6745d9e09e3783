//! [`Command`] for creating a new [`Quote`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        quote::{self, Terms},
        Address, Quote,
    },
    infra::{database, Database},
    Service,
};

use super::{create_address, Command, CreateAddress};

/// Name of the constraint guarding [`quote::Id`] uniqueness.
pub const ID_CONSTRAINT: &str = "quotes_pkey";

/// Number of [`quote::Id`] generation attempts after which every next one is
/// reported.
const QUIET_ATTEMPTS: usize = 3;

/// [`Command`] for creating a new [`Quote`].
///
/// [`quote::Id`] of the new [`Quote`] is always generated.
#[derive(Clone, Debug)]
pub struct CreateQuote {
    /// [`DateTime`] when the policy of a new [`Quote`] comes into effect.
    pub effective_at: quote::EffectiveDateTime,

    /// [`Date`] when a previous policy was canceled, if any.
    pub previously_canceled_on: Option<Date>,

    /// Indicator whether the insured property is owned.
    pub is_owned: bool,

    /// [`Address`] of the insured property, created if doesn't exist.
    pub address: Option<CreateAddress>,
}

impl<Db> Command<CreateQuote> for Service<Db>
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
        > + Database<Insert<Quote>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Quote;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateQuote) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateQuote {
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
        let terms = Terms {
            effective_at,
            previously_canceled_on,
            is_owned,
            address,
        };

        let max_attempts = self.config().max_qid_attempts;
        for attempt in 1..=max_attempts {
            if attempt > QUIET_ATTEMPTS {
                log::warn!(
                    "`quote::Id` generation attempt {attempt} of \
                     {max_attempts}",
                );
            }

            let id = quote::Id::generate(&mut rand::thread_rng());

            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let existing = tx
                .execute(Select(By::<Option<Quote>, _>::new(id.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if existing.is_some() {
                continue;
            }

            let quote =
                Quote::new(id, terms.clone(), DateTime::now().coerce());

            let inserted = tx
                .execute(Insert(quote.clone()))
                .await
                .map(drop);
            let committed = match inserted {
                Ok(()) => tx.execute(Commit).await.map(drop),
                Err(e) => Err(e),
            };
            match committed {
                Ok(()) => return Ok(quote),
                Err(e)
                    if e.as_ref().is_unique_violation(Some(ID_CONSTRAINT)) =>
                {
                    // Taken concurrently, so generate another one.
                }
                Err(e) => {
                    return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
                }
            }
        }

        log::error!(
            "no vacant `quote::Id` found after {max_attempts} attempts",
        );
        Err(tracerr::new!(E::IdsExhausted(max_attempts)))
    }
}

/// Error of [`CreateQuote`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// No vacant [`quote::Id`] has been generated.
    #[display("No vacant `quote::Id` generated in {_0} attempts")]
    #[from(ignore)]
    IdsExhausted(#[error(not(source))] usize),
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime};

    use crate::{
        command::CreateAddress,
        domain::{
            address::{State, ZipCode},
            quote,
        },
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::{CreateQuote, ExecutionError};

    fn cmd(zip_code: i32, state: State) -> CreateQuote {
        CreateQuote {
            effective_at: DateTime::now().coerce(),
            previously_canceled_on: Date::from_ymd(2021, 9, 1),
            is_owned: false,
            address: Some(CreateAddress {
                zip_code: ZipCode::new(zip_code).unwrap(),
                state,
            }),
        }
    }

    #[tokio::test]
    async fn generates_id() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc.execute(cmd(90210, State::Ca)).await.unwrap();

        assert!(quote::Id::new(AsRef::<str>::as_ref(quote.id())).is_some());
        assert_eq!(quote.cost_monthly().unwrap().to_string(), "13.99");
        assert_eq!(db.quotes().len(), 1);
    }

    #[tokio::test]
    async fn shares_same_address() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let mut ids = Vec::new();
        for _ in 0..5 {
            let quote = svc.execute(cmd(90210, State::Ca)).await.unwrap();
            ids.push(quote.id().clone());
        }
        ids.sort_by(|a, b| AsRef::<str>::as_ref(a).cmp(AsRef::<str>::as_ref(b)));
        ids.dedup();

        assert_eq!(ids.len(), 5);
        assert_eq!(db.quotes().len(), 5);
        assert_eq!(db.addresses().len(), 1);
    }

    #[tokio::test]
    async fn creates_without_address() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc
            .execute(CreateQuote {
                address: None,
                ..cmd(90210, State::Ca)
            })
            .await
            .unwrap();

        assert!(quote.address().is_none());
        assert!(quote.cost_monthly().is_err());
        assert!(db.addresses().is_empty());
    }

    #[tokio::test]
    async fn retries_on_id_collision() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        db.reject_next_quote_inserts(5);
        let quote = svc.execute(cmd(10001, State::Ny)).await.unwrap();

        assert_eq!(db.quotes().len(), 1);
        assert_eq!(db.quotes()[0].id(), quote.id());
    }

    #[tokio::test]
    async fn fails_when_ids_exhausted() {
        let db = Memory::default();
        let svc = Service::new(
            Config {
                max_qid_attempts: 4,
            },
            db.clone(),
        );

        db.reject_next_quote_inserts(4);
        let err = svc.execute(cmd(10001, State::Ny)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::IdsExhausted(4)));
        assert!(db.quotes().is_empty());
    }
}
