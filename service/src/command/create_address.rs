//! [`Command`] for creating a new [`Address`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::address::{State, ZipCode};
use crate::{
    domain::{address, Address},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Address`].
///
/// Returns the existing [`Address`] if one with the same attributes exists
/// already.
#[derive(Clone, Copy, Debug)]
pub struct CreateAddress {
    /// [`ZipCode`] of a new [`Address`].
    pub zip_code: address::ZipCode,

    /// [`State`] of a new [`Address`].
    pub state: address::State,
}

impl<Db> Command<CreateAddress> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Address>, address::Hash>>,
            Ok = Option<Address>,
            Err = Traced<database::Error>,
        > + Database<Insert<Address>, Err = Traced<database::Error>>
        + Database<
            Lock<By<Address, address::Hash>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Address;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateAddress) -> Result<Self::Ok, Self::Err> {
        let CreateAddress { zip_code, state } = cmd;

        let address = Address::new(zip_code, state);

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        // Avoid concurrent creation of the same `Address`.
        tx.execute(Lock(By::new(address.hash)))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let existing = tx
            .execute(Select(By::new(address.hash)))
            .await
            .map_err(tracerr::wrap!())?;
        if let Some(address) = existing {
            return Ok(address);
        }

        tx.execute(Insert(address.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(address)
    }
}

/// Error of [`CreateAddress`] [`Command`] execution.
pub type ExecutionError = database::Error;

#[cfg(test)]
mod spec {
    use crate::{
        domain::address::{State, ZipCode},
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::CreateAddress;

    fn cmd(zip_code: i32, state: State) -> CreateAddress {
        CreateAddress {
            zip_code: ZipCode::new(zip_code).unwrap(),
            state,
        }
    }

    #[tokio::test]
    async fn deduplicates_same_attributes() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let first = svc.execute(cmd(90210, State::Ca)).await.unwrap();
        let second = svc.execute(cmd(90210, State::Ca)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(db.addresses().len(), 1);
    }

    #[tokio::test]
    async fn distinguishes_different_attributes() {
        let db = Memory::default();
        let svc = Service::new(Config::default(), db.clone());

        let ca = svc.execute(cmd(90210, State::Ca)).await.unwrap();
        let or = svc.execute(cmd(90210, State::Or)).await.unwrap();
        let zip = svc.execute(cmd(90211, State::Ca)).await.unwrap();

        assert_ne!(ca.id, or.id);
        assert_ne!(ca.id, zip.id);
        assert_eq!(db.addresses().len(), 3);
    }
}
