//! [`Quote`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        address,
        quote::{self, Terms},
        Address, Quote,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Locks the `quotes_lock` row of a [`Quote`] until the end of the current
/// transaction.
///
/// A committed lock row stays in the table, so the conflicting row has to be
/// updated to be locked. `DO NOTHING` takes no row lock.
const LOCK_SQL: &str = "\
    INSERT INTO quotes_lock \
    VALUES ($1::VARCHAR) \
    ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";

/// Restores a [`Quote`] from the provided [`Row`] joined with its
/// [`Address`].
fn quote_from_row(row: &Row) -> Quote {
    let address = row
        .get::<_, Option<address::Id>>("address_id")
        .map(|id| Address {
            id,
            hash: row.get("address_hash"),
            zip_code: row.get("zipcode"),
            state: row.get("state"),
        });
    Quote::new(
        row.get("id"),
        Terms {
            effective_at: row.get("date_effective"),
            previously_canceled_on: row.get("date_previous_canceled"),
            is_owned: row.get("is_owned"),
            address,
        },
        row.get("created_at"),
    )
}

impl<C> Database<Select<By<Option<Quote>, quote::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Quote>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Quote>, quote::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: quote::Id = by.into_inner();

        const SQL: &str = "\
            SELECT q.id, q.date_effective, q.date_previous_canceled, \
                   q.is_owned, q.created_at, \
                   a.id AS address_id, a.hash AS address_hash, \
                   a.zipcode, a.state \
            FROM quotes AS q \
            LEFT JOIN addresses AS a ON a.id = q.address_id \
            WHERE q.id = $1::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(quote_from_row))
    }
}

impl<C> Database<Insert<Quote>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(quote): Insert<Quote>,
    ) -> Result<Self::Ok, Self::Err> {
        let address_id = quote.address().map(|a| a.id);

        const SQL: &str = "\
            INSERT INTO quotes (\
                id, date_effective, date_previous_canceled, is_owned, \
                address_id, created_at\
            ) VALUES (\
                $1::VARCHAR, $2::TIMESTAMPTZ, $3::DATE, $4::BOOL, \
                $5::UUID, $6::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                quote.id(),
                &quote.effective_at(),
                &quote.previously_canceled_on(),
                &quote.is_owned(),
                &address_id,
                &quote.created_at(),
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Quote>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(quote): Update<Quote>,
    ) -> Result<Self::Ok, Self::Err> {
        let address_id = quote.address().map(|a| a.id);

        const SQL: &str = "\
            UPDATE quotes \
            SET date_effective = $2::TIMESTAMPTZ, \
                date_previous_canceled = $3::DATE, \
                is_owned = $4::BOOL, \
                address_id = $5::UUID \
            WHERE id = $1::VARCHAR";
        self.exec(
            SQL,
            &[
                quote.id(),
                &quote.effective_at(),
                &quote.previously_canceled_on(),
                &quote.is_owned(),
                &address_id,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Quote, quote::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Quote, quote::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: quote::Id = by.into_inner();

        // `purchases.quote_id` is nulled by `ON DELETE SET NULL`.
        const SQL: &str = "\
            WITH unlocked AS (\
                DELETE FROM quotes_lock \
                WHERE id = $1::VARCHAR\
            ) \
            DELETE FROM quotes \
            WHERE id = $1::VARCHAR";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Quote, quote::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Quote, quote::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: quote::Id = by.into_inner();

        self.query(LOCK_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<Select<By<read::quote::list::Page, read::quote::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
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

        let limit = i32::try_from(arguments.limit()).unwrap_or(i32::MAX - 1)
            + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let address_idx = address_id.as_ref().map(|a| {
            ps.push(a);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM quotes \
             WHERE true \
                   {cursor} \
                   {address_filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::VARCHAR"))
            }),
            address_filtering =
                address_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND address_id = ${idx}::UUID"))
                }),
            order = arguments.kind().order().sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let id: quote::Id = row.get("id");
                (id.clone(), id)
            })
            .collect::<Vec<_>>();

        Ok(read::quote::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<By<read::quote::list::TotalCount, read::quote::list::Filter>>,
    > for Postgres<C>
where
    C: Connection,
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

        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM quotes \
            WHERE $1::UUID IS NULL \
               OR address_id = $1::UUID";
        self.query_opt(SQL, &[&address_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map_or(0, |r| r.get::<_, i32>(0)).into())
    }
}

#[cfg(test)]
mod spec {
    use super::LOCK_SQL;

    #[test]
    fn lock_holds_committed_row() {
        assert!(LOCK_SQL.ends_with("DO UPDATE SET id = EXCLUDED.id"));
        assert!(!LOCK_SQL.contains("DO NOTHING"));
    }
}
