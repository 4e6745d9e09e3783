//! [`Purchase`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        purchase::{self, Snapshot},
        Purchase,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Restores a [`Purchase`] from the provided [`Row`].
fn purchase_from_row(row: &Row) -> Purchase {
    Purchase {
        id: row.get("id"),
        quote_id: row.get("quote_id"),
        snapshot: Snapshot {
            payment_frequency: row.get("payment_frequency"),
            payment_amount: row.get("payment_amount"),
            discount_canceled_amt: row.get("discount_canceled_amt"),
            discount_owns_property_amt: row.get("discount_owns_property_amt"),
            fee_canceled_amt: row.get("fee_canceled_amt"),
            fee_state_amt: row.get("fee_state_amt"),
        },
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Insert<purchase::New>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Purchase;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<purchase::New>,
    ) -> Result<Self::Ok, Self::Err> {
        let purchase::New {
            quote_id,
            snapshot:
                Snapshot {
                    payment_frequency,
                    payment_amount,
                    discount_canceled_amt,
                    discount_owns_property_amt,
                    fee_canceled_amt,
                    fee_state_amt,
                },
            created_at,
        } = new;

        const SQL: &str = "\
            INSERT INTO purchases (\
                quote_id, payment_frequency, payment_amount, \
                discount_canceled_amt, discount_owns_property_amt, \
                fee_canceled_amt, fee_state_amt, \
                created_at\
            ) VALUES (\
                $1::VARCHAR, $2::INT2, $3::NUMERIC, \
                $4::NUMERIC, $5::NUMERIC, \
                $6::NUMERIC, $7::NUMERIC, \
                $8::TIMESTAMPTZ\
            ) \
            RETURNING id, quote_id, payment_frequency, payment_amount, \
                      discount_canceled_amt, discount_owns_property_amt, \
                      fee_canceled_amt, fee_state_amt, \
                      created_at";
        self.query_opt(
            SQL,
            &[
                &quote_id,
                &payment_frequency,
                &payment_amount,
                &discount_canceled_amt,
                &discount_owns_property_amt,
                &fee_canceled_amt,
                &fee_state_amt,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| purchase_from_row(&row.expect("always exists")))
    }
}

impl<C> Database<Select<By<Option<Purchase>, purchase::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Purchase>, purchase::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: purchase::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, quote_id, payment_frequency, payment_amount, \
                   discount_canceled_amt, discount_owns_property_amt, \
                   fee_canceled_amt, fee_state_amt, \
                   created_at \
            FROM purchases \
            WHERE id = $1::INT8 \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(purchase_from_row))
    }
}

impl<C> Database<Delete<By<Purchase, purchase::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Purchase, purchase::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: purchase::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM purchases \
            WHERE id = $1::INT8";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::purchase::list::Page, read::purchase::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
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

        let limit = i32::try_from(arguments.limit()).unwrap_or(i32::MAX - 1)
            + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let quote_idx = quote_id.as_ref().map(|q| {
            ps.push(q);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM purchases \
             WHERE true \
                   {cursor} \
                   {quote_filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::INT8"))
            }),
            quote_filtering =
                quote_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND quote_id = ${idx}::VARCHAR"))
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
                let id = row.get("id");
                (id, id)
            })
            .collect::<Vec<_>>();

        Ok(read::purchase::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<
            By<read::purchase::list::TotalCount, read::purchase::list::Filter>,
        >,
    > for Postgres<C>
where
    C: Connection,
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

        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM purchases \
            WHERE $1::VARCHAR IS NULL \
               OR quote_id = $1::VARCHAR";
        self.query_opt(SQL, &[&quote_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map_or(0, |r| r.get::<_, i32>(0)).into())
    }
}
