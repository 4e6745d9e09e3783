//! In-memory [`Database`] implementation.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    pagination::{Arguments, Kind, Page},
    Date,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{
        address, purchase,
        quote::{self, Terms},
        Address, Purchase, Quote,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] client.
///
/// Clones share the same storage. Every write is applied immediately, so
/// [`Transact`] and [`Commit`] are no-ops.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<Storage>>);

/// Contents of a [`Memory`] database.
#[derive(Debug, Default)]
struct Storage {
    /// Stored [`Address`]es.
    addresses: Vec<Address>,

    /// Stored [`Quote`]s.
    quotes: Vec<QuoteRow>,

    /// IDs of the locked [`Quote`]s.
    quote_locks: HashSet<quote::Id>,

    /// Stored [`Purchase`]s.
    purchases: Vec<Purchase>,

    /// Last assigned [`purchase::Id`].
    last_purchase_id: i64,

    /// Number of next [`Quote`] insertions to reject as duplicates.
    rejected_quote_inserts: usize,
}

/// Stored [`Quote`] referring its [`Address`] by ID.
#[derive(Clone, Debug)]
struct QuoteRow {
    /// ID of the [`Quote`].
    id: quote::Id,

    /// [`quote::EffectiveDateTime`] of the [`Quote`].
    effective_at: quote::EffectiveDateTime,

    /// Date when a previous policy was canceled, if any.
    previously_canceled_on: Option<Date>,

    /// Indicator whether the insured property is owned.
    is_owned: bool,

    /// ID of the [`Address`] of the insured property.
    address_id: Option<address::Id>,

    /// [`quote::CreationDateTime`] of the [`Quote`].
    created_at: quote::CreationDateTime,
}

impl From<&Quote> for QuoteRow {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id().clone(),
            effective_at: quote.effective_at(),
            previously_canceled_on: quote.previously_canceled_on(),
            is_owned: quote.is_owned(),
            address_id: quote.address().map(|a| a.id),
            created_at: quote.created_at(),
        }
    }
}

impl Storage {
    /// Restores a [`Quote`] from the provided [`QuoteRow`].
    fn quote(&self, row: &QuoteRow) -> Quote {
        let address = row.address_id.and_then(|id| {
            self.addresses.iter().find(|a| a.id == id).cloned()
        });
        Quote::new(
            row.id.clone(),
            Terms {
                effective_at: row.effective_at,
                previously_canceled_on: row.previously_canceled_on,
                is_owned: row.is_owned,
                address,
            },
            row.created_at,
        )
    }

    /// Checks the [`Address`] referred by a [`Quote`] exists.
    fn check_address(&self, row: &QuoteRow) -> Result<(), Error> {
        match row.address_id {
            Some(id) if !self.addresses.iter().any(|a| a.id == id) => {
                Err(Error::ForeignKeyViolation("quotes_address_id_fkey"))
            }
            Some(_) | None => Ok(()),
        }
    }
}

impl Memory {
    /// Locks the [`Storage`] of this [`Memory`] database.
    fn storage(&self) -> MutexGuard<'_, Storage> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns all the stored [`Address`]es.
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.storage().addresses.clone()
    }

    /// Returns all the stored [`Quote`]s.
    #[must_use]
    pub fn quotes(&self) -> Vec<Quote> {
        let storage = self.storage();
        storage.quotes.iter().map(|r| storage.quote(r)).collect()
    }

    /// Returns IDs of all the locked [`Quote`]s.
    #[must_use]
    pub fn quote_locks(&self) -> HashSet<quote::Id> {
        self.storage().quote_locks.clone()
    }

    /// Returns all the stored [`Purchase`]s.
    #[must_use]
    pub fn purchases(&self) -> Vec<Purchase> {
        self.storage().purchases.clone()
    }

    /// Makes the next `count` [`Quote`] insertions fail with a
    /// [`quote::Id`] uniqueness violation.
    pub fn reject_next_quote_inserts(&self, count: usize) {
        self.storage().rejected_quote_inserts = count;
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint violation.
    #[display("Unique constraint `{_0}` violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Foreign key constraint violation.
    #[display("Foreign key constraint `{_0}` violated")]
    ForeignKeyViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
            Self::ForeignKeyViolation(_) => false,
        }
    }
}

/// Returns a [`Page`] of the provided sorted cursors.
fn paginate<C: Clone + Ord>(
    mut cursors: Vec<C>,
    arguments: &Arguments<C>,
) -> Page<C, C> {
    if let Some(cursor) = arguments.cursor() {
        cursors.retain(|c| match arguments.kind() {
            Kind::Forward => c > cursor,
            Kind::ForwardIncluding => c >= cursor,
            Kind::Backward => c < cursor,
            Kind::BackwardIncluding => c <= cursor,
        });
    }
    cursors.sort();
    if arguments.kind().is_backward() {
        cursors.reverse();
    }

    let has_more = cursors.len() > arguments.limit();
    let edges = cursors
        .into_iter()
        .take(arguments.limit())
        .map(|c| (c.clone(), c))
        .collect::<Vec<_>>();
    Page::new(arguments, edges, has_more)
}

/// Converts the provided number of items into a total count.
fn total_count<T: From<i32>>(count: usize) -> T {
    i32::try_from(count).unwrap_or(i32::MAX).into()
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<Address, address::Hash>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Address, address::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Address>, address::Hash>>> for Memory {
    type Ok = Option<Address>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Address>, address::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        let hash = by.into_inner();
        Ok(self
            .storage()
            .addresses
            .iter()
            .find(|a| a.hash == hash)
            .cloned())
    }
}

impl Database<Insert<Address>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(address): Insert<Address>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut storage = self.storage();
        if storage.addresses.iter().any(|a| a.id == address.id) {
            return Err(tracerr::new!(Error::UniqueViolation("addresses_pkey")))
                .map_err(tracerr::map_from);
        }
        if storage.addresses.iter().any(|a| a.hash == address.hash) {
            return Err(tracerr::new!(Error::UniqueViolation(
                "addresses_hash_key"
            )))
            .map_err(tracerr::map_from);
        }
        storage.addresses.push(address);
        Ok(())
    }
}

impl Database<Lock<By<Quote, quote::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Quote, quote::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.storage().quote_locks.insert(by.into_inner());
        Ok(())
    }
}

impl Database<Select<By<Option<Quote>, quote::Id>>> for Memory {
    type Ok = Option<Quote>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Quote>, quote::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let storage = self.storage();
        Ok(storage
            .quotes
            .iter()
            .find(|r| r.id == id)
            .map(|r| storage.quote(r)))
    }
}

impl Database<Insert<Quote>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(quote): Insert<Quote>,
    ) -> Result<Self::Ok, Self::Err> {
        let row = QuoteRow::from(&quote);

        let mut storage = self.storage();
        if storage.rejected_quote_inserts > 0 {
            storage.rejected_quote_inserts -= 1;
            return Err(tracerr::new!(Error::UniqueViolation("quotes_pkey")))
                .map_err(tracerr::map_from);
        }
        if storage.quotes.iter().any(|r| r.id == row.id) {
            return Err(tracerr::new!(Error::UniqueViolation("quotes_pkey")))
                .map_err(tracerr::map_from);
        }
        storage
            .check_address(&row)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;

        storage.quotes.push(row);
        Ok(())
    }
}

impl Database<Update<Quote>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(quote): Update<Quote>,
    ) -> Result<Self::Ok, Self::Err> {
        let row = QuoteRow::from(&quote);

        let mut storage = self.storage();
        storage
            .check_address(&row)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;

        if let Some(existing) =
            storage.quotes.iter_mut().find(|r| r.id == row.id)
        {
            *existing = row;
        }
        Ok(())
    }
}

impl Database<Delete<By<Quote, quote::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Quote, quote::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let mut storage = self.storage();
        _ = storage.quote_locks.remove(&id);
        storage.quotes.retain(|r| r.id != id);
        for p in &mut storage.purchases {
            if p.quote_id.as_ref() == Some(&id) {
                p.quote_id = None;
            }
        }
        Ok(())
    }
}

impl Database<Select<By<read::quote::list::Page, read::quote::list::Selector>>>
    for Memory
{
    type Ok = read::quote::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::quote::list::Page, read::quote::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::quote::list::Selector {
            arguments,
            filter: read::quote::list::Filter { address_id },
        } = by.into_inner();

        let ids = self
            .storage()
            .quotes
            .iter()
            .filter(|r| address_id.map_or(true, |a| r.address_id == Some(a)))
            .map(|r| r.id.clone())
            .collect();
        Ok(paginate(ids, &arguments))
    }
}

impl
    Database<
        Select<By<read::quote::list::TotalCount, read::quote::list::Filter>>,
    > for Memory
{
    type Ok = read::quote::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::quote::list::TotalCount, read::quote::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::quote::list::Filter { address_id } = by.into_inner();

        Ok(total_count(
            self.storage()
                .quotes
                .iter()
                .filter(|r| {
                    address_id.map_or(true, |a| r.address_id == Some(a))
                })
                .count(),
        ))
    }
}

impl Database<Insert<purchase::New>> for Memory {
    type Ok = Purchase;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<purchase::New>,
    ) -> Result<Self::Ok, Self::Err> {
        let purchase::New {
            quote_id,
            snapshot,
            created_at,
        } = new;

        let mut storage = self.storage();
        if !storage.quotes.iter().any(|r| r.id == quote_id) {
            return Err(tracerr::new!(Error::ForeignKeyViolation(
                "purchases_quote_id_fkey"
            )))
            .map_err(tracerr::map_from);
        }

        storage.last_purchase_id += 1;
        let purchase = Purchase {
            id: storage.last_purchase_id.into(),
            quote_id: Some(quote_id),
            snapshot,
            created_at,
        };
        storage.purchases.push(purchase.clone());
        Ok(purchase)
    }
}

impl Database<Select<By<Option<Purchase>, purchase::Id>>> for Memory {
    type Ok = Option<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Purchase>, purchase::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .storage()
            .purchases
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }
}

impl Database<Delete<By<Purchase, purchase::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Purchase, purchase::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.storage().purchases.retain(|p| p.id != id);
        Ok(())
    }
}

impl
    Database<
        Select<By<read::purchase::list::Page, read::purchase::list::Selector>>,
    > for Memory
{
    type Ok = read::purchase::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::purchase::list::Page, read::purchase::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::purchase::list::Selector {
            arguments,
            filter: read::purchase::list::Filter { quote_id },
        } = by.into_inner();

        let ids = self
            .storage()
            .purchases
            .iter()
            .filter(|p| {
                quote_id.is_none() || p.quote_id.as_ref() == quote_id.as_ref()
            })
            .map(|p| p.id)
            .collect();
        Ok(paginate(ids, &arguments))
    }
}

impl
    Database<
        Select<
            By<read::purchase::list::TotalCount, read::purchase::list::Filter>,
        >,
    > for Memory
{
    type Ok = read::purchase::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::purchase::list::TotalCount, read::purchase::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::purchase::list::Filter { quote_id } = by.into_inner();

        Ok(total_count(
            self.storage()
                .purchases
                .iter()
                .filter(|p| {
                    quote_id.is_none()
                        || p.quote_id.as_ref() == quote_id.as_ref()
                })
                .count(),
        ))
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        pagination::Arguments,
        DateTime,
    };

    use crate::{
        command::{CreateAddress, CreatePurchase, CreateQuote},
        domain::{
            address::{State, ZipCode},
            pricing::Cadence,
            quote,
        },
        infra::Database as _,
        read, Command as _, Config, Service,
    };

    use super::{paginate, Memory};

    #[test]
    fn paginates_forward_and_backward() {
        let ids = vec![5, 1, 4, 2, 3];

        let args = Arguments::new(Some(2), None, None, None, 10).unwrap();
        let page = paginate(ids.clone(), &args);
        assert_eq!(
            page.edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            [1, 2],
        );
        assert!(page.page_info().has_next_page);

        let args = Arguments::new(Some(2), Some(3), None, None, 10).unwrap();
        let page = paginate(ids.clone(), &args);
        assert_eq!(
            page.edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            [4, 5],
        );
        assert!(!page.page_info().has_next_page);

        let args = Arguments::new(None, None, Some(2), Some(3), 10).unwrap();
        let page = paginate(ids.clone(), &args);
        assert_eq!(
            page.edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            [2, 1],
        );
        assert!(!page.page_info().has_previous_page);

        let args = Arguments::new(None, Some(3), None, Some(3), 10).unwrap();
        let page = paginate(ids, &args);
        assert_eq!(
            page.edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            [3],
        );
    }

    #[tokio::test]
    async fn lists_quotes_by_address() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let create = |state| CreateQuote {
            effective_at: DateTime::now().coerce(),
            previously_canceled_on: None,
            is_owned: true,
            address: Some(CreateAddress {
                zip_code: ZipCode::new(12345).unwrap(),
                state,
            }),
        };
        let first = svc.execute(create(State::Wa)).await.unwrap();
        let _ = svc.execute(create(State::Wa)).await.unwrap();
        let _ = svc.execute(create(State::Wy)).await.unwrap();

        let filter = read::quote::list::Filter {
            address_id: first.address().map(|a| a.id),
        };
        let page = db
            .execute(Select(By::<read::quote::list::Page, _>::new(
                read::quote::list::Selector {
                    arguments: Arguments::new(None, None, None, None, 10)
                        .unwrap(),
                    filter,
                },
            )))
            .await
            .unwrap();
        assert_eq!(page.edges.len(), 2);

        let count = db
            .execute(Select(By::<read::quote::list::TotalCount, _>::new(
                filter,
            )))
            .await
            .unwrap();
        assert_eq!(i32::from(count), 2);

        let count = db
            .execute(Select(By::<read::quote::list::TotalCount, _>::new(
                read::quote::list::Filter::default(),
            )))
            .await
            .unwrap();
        assert_eq!(i32::from(count), 3);
    }

    #[tokio::test]
    async fn lists_purchases_by_quote() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let quote = svc
            .execute(CreateQuote {
                effective_at: DateTime::now().coerce(),
                previously_canceled_on: None,
                is_owned: false,
                address: Some(CreateAddress {
                    zip_code: ZipCode::new(80202).unwrap(),
                    state: State::Co,
                }),
            })
            .await
            .unwrap();
        for cadence in [Cadence::Monthly, Cadence::Biannually] {
            let _ = svc
                .execute(CreatePurchase {
                    quote_id: quote.id().clone(),
                    payment_frequency: cadence,
                })
                .await
                .unwrap();
        }

        let selector = |quote_id: Option<quote::Id>| {
            read::purchase::list::Selector {
                arguments: Arguments::new(Some(1), None, None, None, 10)
                    .unwrap(),
                filter: read::purchase::list::Filter { quote_id },
            }
        };

        let page = db
            .execute(Select(By::<read::purchase::list::Page, _>::new(
                selector(Some(quote.id().clone())),
            )))
            .await
            .unwrap();
        assert_eq!(page.edges.len(), 1);
        assert!(page.page_info().has_next_page);

        let page = db
            .execute(Select(By::<read::purchase::list::Page, _>::new(
                selector(Some(quote::Id::new("AAAAAAAAAA").unwrap())),
            )))
            .await
            .unwrap();
        assert!(page.edges.is_empty());
    }
}
