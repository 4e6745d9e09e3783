//! [`Address`]-related definitions.

use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLInputObject, GraphQLScalar};
use service::{command, domain};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    define_error, Context, Error,
};

/// An address of an insured property.
#[derive(Clone, Debug, From)]
pub struct Address(domain::Address);

/// An address of an insured property.
#[graphql_object(context = Context)]
impl Address {
    /// Unique identifier of this `Address`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Address.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Zip code of this `Address`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Address.zipcode",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn zipcode(&self) -> i32 {
        self.0.zip_code.into()
    }

    /// US state (or the District of Columbia) of this `Address`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Address.state",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn state(&self) -> State {
        self.0.state.into()
    }

    /// Indicator whether this `Address` is located in a state with volcanic
    /// activity.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Address.hasVolcano",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn has_volcano(&self) -> bool {
        self.0.has_volcano()
    }
}

/// Unique identifier of an `Address`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::address::Id)]
#[into(domain::address::Id)]
#[graphql(name = "AddressId", transparent)]
pub struct Id(Uuid);

/// Two-letter code of a US state (or the District of Columbia).
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "AddressState",
    with = scalar::Via::<domain::address::State>,
)]
pub struct State(domain::address::State);

/// Address of an insured property.
///
/// `state` is accepted as a raw string, so its absence and invalidity are
/// reported with dedicated error codes.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "AddressInput")]
pub struct Input {
    /// Zip code in `0..=99999` range.
    pub zipcode: i32,

    /// Two-letter code of a US state (or `DC`), in upper case.
    pub state: Option<String>,
}

impl TryFrom<Input> for command::CreateAddress {
    type Error = Error;

    fn try_from(input: Input) -> Result<Self, Self::Error> {
        let Input { zipcode, state } = input;

        let zip_code = domain::address::ZipCode::new(zipcode)
            .ok_or(AddressError::ZipCodeInvalid)?;
        let state = state
            .ok_or(AddressError::StateMissing)?
            .parse::<domain::address::State>()
            .map_err(|_| AddressError::StateInvalid)?;

        Ok(Self { zip_code, state })
    }
}

define_error! {
    enum AddressError {
        #[code = "ADDRESS_STATE_INVALID"]
        #[status = BAD_REQUEST]
        #[message = "`AddressInput.state` is not a US state or `DC`"]
        StateInvalid,

        #[code = "ADDRESS_STATE_MISSING"]
        #[status = BAD_REQUEST]
        #[message = "`AddressInput.state` must be provided"]
        StateMissing,

        #[code = "ADDRESS_ZIPCODE_INVALID"]
        #[status = BAD_REQUEST]
        #[message = "`AddressInput.zipcode` must be in `0..=99999` range"]
        ZipCodeInvalid,
    }
}

#[cfg(test)]
mod spec {
    use service::{command::CreateAddress, domain::address::State};

    use super::Input;

    fn input(zipcode: i32, state: Option<&str>) -> Input {
        Input {
            zipcode,
            state: state.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn converts_valid_input() {
        let cmd = CreateAddress::try_from(input(90210, Some("CA"))).unwrap();

        assert_eq!(i32::from(cmd.zip_code), 90210);
        assert_eq!(cmd.state, State::Ca);
    }

    #[test]
    fn reports_invalid_input() {
        let code = |i: Input| CreateAddress::try_from(i).unwrap_err().code;

        assert_eq!(code(input(90210, Some("XX"))), "ADDRESS_STATE_INVALID");
        assert_eq!(code(input(90210, Some("ca"))), "ADDRESS_STATE_INVALID");
        assert_eq!(code(input(90210, None)), "ADDRESS_STATE_MISSING");
        assert_eq!(code(input(100_000, Some("CA"))), "ADDRESS_ZIPCODE_INVALID");
        assert_eq!(code(input(-1, Some("CA"))), "ADDRESS_ZIPCODE_INVALID");
    }
}
