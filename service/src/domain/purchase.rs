//! [`Purchase`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

use crate::domain::{
    pricing::{rule, Cadence, Category},
    quote::{self, MissingAddress},
    Quote,
};

/// Accepted [`Quote`] with its pricing frozen at the acceptance time.
#[derive(Clone, Debug)]
pub struct Purchase {
    /// ID of this [`Purchase`].
    pub id: Id,

    /// ID of the purchased [`Quote`].
    ///
    /// [`None`] once the [`Quote`] is deleted.
    pub quote_id: Option<quote::Id>,

    /// Frozen pricing of this [`Purchase`].
    pub snapshot: Snapshot,

    /// [`DateTime`] when this [`Purchase`] was created.
    pub created_at: CreationDateTime,
}

/// New [`Purchase`] to be persisted.
#[derive(Clone, Debug)]
pub struct New {
    /// ID of the purchased [`Quote`].
    pub quote_id: quote::Id,

    /// Frozen pricing of the [`Purchase`].
    pub snapshot: Snapshot,

    /// [`DateTime`] when the [`Purchase`] was created.
    pub created_at: CreationDateTime,
}

/// Pricing of a [`Quote`] frozen at the acceptance time.
///
/// Amounts are kept with their full precision.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot {
    /// [`Cadence`] the policy is billed with.
    pub payment_frequency: Cadence,

    /// Final cost billed every period.
    pub payment_amount: Money,

    /// Amount of the `canceled` discount.
    pub discount_canceled_amt: Money,

    /// Amount of the `owns_property` discount.
    pub discount_owns_property_amt: Money,

    /// Amount of the `canceled` fee.
    pub fee_canceled_amt: Money,

    /// Amount of the `state_with_volcano` fee.
    pub fee_state_amt: Money,
}

impl Snapshot {
    /// Freezes the pricing of the provided [`Quote`] billed with the provided
    /// [`Cadence`].
    ///
    /// # Errors
    ///
    /// If the [`Quote`] has no address to be priced by.
    pub fn freeze(
        quote: &Quote,
        payment_frequency: Cadence,
    ) -> Result<Self, MissingAddress> {
        let premium = quote.premium(payment_frequency)?;
        let b = &premium.breakdown;
        Ok(Self {
            payment_frequency,
            payment_amount: premium.cost,
            discount_canceled_amt: b.money(Category::Discount, rule::CANCELED),
            discount_owns_property_amt: b
                .money(Category::Discount, rule::OWNS_PROPERTY),
            fee_canceled_amt: b.money(Category::Fee, rule::CANCELED),
            fee_state_amt: b.money(Category::Fee, rule::STATE_WITH_VOLCANO),
        })
    }
}

/// ID of a [`Purchase`].
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(i64);

/// [`DateTime`] when a [`Purchase`] was created.
pub type CreationDateTime = DateTimeOf<(Purchase, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{Date, DateTime, Money};
    use rust_decimal_macros::dec;

    use super::Snapshot;
    use crate::domain::{
        address::{State, ZipCode},
        pricing::Cadence,
        quote::{self, Terms},
        Address, Quote,
    };

    fn quote(state: State, canceled: bool, is_owned: bool) -> Quote {
        Quote::new(
            quote::Id::new("QQQQQ00000").unwrap(),
            Terms {
                effective_at: DateTime::now().coerce(),
                previously_canceled_on: canceled
                    .then(|| Date::from_ymd(2021, 9, 1).unwrap()),
                is_owned,
                address: Some(Address::new(
                    ZipCode::new(83702).unwrap(),
                    state,
                )),
            },
            DateTime::now().coerce(),
        )
    }

    #[test]
    fn freezes_monthly_pricing() {
        let snapshot =
            Snapshot::freeze(&quote(State::Id, true, false), Cadence::Monthly)
                .unwrap();

        assert_eq!(
            snapshot,
            Snapshot {
                payment_frequency: Cadence::Monthly,
                payment_amount: Money::new(dec!(13.986)),
                discount_canceled_amt: Money::ZERO,
                discount_owns_property_amt: Money::ZERO,
                fee_canceled_amt: Money::new(dec!(1.4985)),
                fee_state_amt: Money::new(dec!(2.4975)),
            },
        );
    }

    #[test]
    fn freezes_biannual_pricing() {
        let snapshot = Snapshot::freeze(
            &quote(State::Tx, false, true),
            Cadence::Biannually,
        )
        .unwrap();

        assert_eq!(snapshot.payment_frequency, Cadence::Biannually);
        assert_eq!(snapshot.payment_amount, Money::new(dec!(41.958)));
        assert_eq!(snapshot.discount_canceled_amt, Money::new(dec!(5.994)));
        assert_eq!(
            snapshot.discount_owns_property_amt,
            Money::new(dec!(11.988)),
        );
        assert_eq!(snapshot.fee_canceled_amt, Money::ZERO);
        assert_eq!(snapshot.fee_state_amt, Money::ZERO);
    }

    #[test]
    fn requires_address() {
        let mut q = quote(State::Ca, false, false);
        q.set_address(None);

        assert!(Snapshot::freeze(&q, Cadence::Monthly).is_err());
    }
}
