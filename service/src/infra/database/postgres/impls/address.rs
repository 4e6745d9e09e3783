//! [`Address`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select};
use tracerr::Traced;

use crate::{
    domain::{address, Address},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Address>, address::Hash>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Address>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Address>, address::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let hash: address::Hash = by.into_inner();

        const SQL: &str = "\
            SELECT id, hash, zipcode, state \
            FROM addresses \
            WHERE hash = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&hash])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Address {
                id: row.get("id"),
                hash: row.get("hash"),
                zip_code: row.get("zipcode"),
                state: row.get("state"),
            }))
    }
}

impl<C> Database<Insert<Address>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(address): Insert<Address>,
    ) -> Result<Self::Ok, Self::Err> {
        let Address {
            id,
            hash,
            zip_code,
            state,
        } = address;

        const SQL: &str = "\
            INSERT INTO addresses (id, hash, zipcode, state) \
            VALUES ($1::UUID, $2::UUID, $3::INT4, $4::INT2)";
        self.exec(SQL, &[&id, &hash, &zip_code, &state])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Address, address::Hash>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Address, address::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let hash: address::Hash = by.into_inner();

        const SQL: &str = "\
            INSERT INTO addresses_creation_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (hash) DO UPDATE SET hash = EXCLUDED.hash";
        self.query(SQL, &[&hash])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
