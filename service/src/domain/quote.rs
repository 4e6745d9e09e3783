//! [`Quote`] definitions.

use std::sync::{LazyLock, OnceLock};

#[cfg(doc)]
use common::DateTime;
use common::{unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, FromStr};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rand::Rng;
use regex::Regex;

use crate::domain::{
    pricing::{self, Breakdown, Cadence, Factors, Premium},
    Address,
};

/// Insurance policy quote.
///
/// [`Premium`]s are calculated lazily and cached per [`Cadence`] in this
/// instance. Any attribute change drops the cached [`Premium`]s.
#[derive(Clone, Debug)]
pub struct Quote {
    /// ID of this [`Quote`].
    id: Id,

    /// [`DateTime`] when the policy of this [`Quote`] comes into effect.
    effective_at: EffectiveDateTime,

    /// [`Date`] when a previous policy was canceled, if any.
    previously_canceled_on: Option<Date>,

    /// Indicator whether the insured property is owned.
    is_owned: bool,

    /// [`Address`] of the insured property.
    address: Option<Address>,

    /// [`DateTime`] when this [`Quote`] was created.
    created_at: CreationDateTime,

    /// Cached [`Premium`]s of this [`Quote`].
    premiums: Premiums,
}

impl Quote {
    /// Creates a new [`Quote`] out of the provided [`Terms`].
    #[must_use]
    pub fn new(id: Id, terms: Terms, created_at: CreationDateTime) -> Self {
        let Terms {
            effective_at,
            previously_canceled_on,
            is_owned,
            address,
        } = terms;
        Self {
            id,
            effective_at,
            previously_canceled_on,
            is_owned,
            address,
            created_at,
            premiums: Premiums::default(),
        }
    }

    /// Returns the [`Id`] of this [`Quote`].
    #[must_use]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the [`DateTime`] when the policy comes into effect.
    #[must_use]
    pub fn effective_at(&self) -> EffectiveDateTime {
        self.effective_at
    }

    /// Returns the [`Date`] when a previous policy was canceled, if any.
    #[must_use]
    pub fn previously_canceled_on(&self) -> Option<Date> {
        self.previously_canceled_on
    }

    /// Indicates whether the insured property is owned.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.is_owned
    }

    /// Returns the [`Address`] of the insured property, if any.
    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Returns the [`DateTime`] when this [`Quote`] was created.
    #[must_use]
    pub fn created_at(&self) -> CreationDateTime {
        self.created_at
    }

    /// Sets the [`DateTime`] when the policy comes into effect.
    pub fn set_effective_at(&mut self, at: EffectiveDateTime) {
        self.effective_at = at;
        self.premiums = Premiums::default();
    }

    /// Sets the [`Date`] when a previous policy was canceled.
    pub fn set_previously_canceled_on(&mut self, on: Option<Date>) {
        self.previously_canceled_on = on;
        self.premiums = Premiums::default();
    }

    /// Sets the indicator whether the insured property is owned.
    pub fn set_is_owned(&mut self, is_owned: bool) {
        self.is_owned = is_owned;
        self.premiums = Premiums::default();
    }

    /// Sets the [`Address`] of the insured property.
    pub fn set_address(&mut self, address: Option<Address>) {
        self.address = address;
        self.premiums = Premiums::default();
    }

    /// Returns the pricing [`Factors`] of this [`Quote`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn factors(&self) -> Result<Factors, MissingAddress> {
        let address = self
            .address
            .as_ref()
            .ok_or_else(|| MissingAddress(self.id.clone()))?;
        Ok(Factors {
            previously_canceled: self.previously_canceled_on.is_some(),
            is_owned: self.is_owned,
            has_volcano: address.has_volcano(),
        })
    }

    /// Returns the [`Premium`] of this [`Quote`] billed with the provided
    /// [`Cadence`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn premium(
        &self,
        cadence: Cadence,
    ) -> Result<&Premium, MissingAddress> {
        if let Some(premium) = self.premiums.of(cadence).get() {
            return Ok(premium);
        }

        let factors = self.factors()?;
        Ok(self.premiums.of(cadence).get_or_init(|| {
            pricing::calculate(cadence.base_cost(), &factors, pricing::RULES)
        }))
    }

    /// Returns the final cost of this [`Quote`] billed with the provided
    /// [`Cadence`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn cost(&self, cadence: Cadence) -> Result<Money, MissingAddress> {
        self.premium(cadence).map(|p| p.cost)
    }

    /// Returns the [`Breakdown`] of this [`Quote`] billed with the provided
    /// [`Cadence`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn breakdown(
        &self,
        cadence: Cadence,
    ) -> Result<&Breakdown, MissingAddress> {
        self.premium(cadence).map(|p| &p.breakdown)
    }

    /// Returns the monthly cost of this [`Quote`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn cost_monthly(&self) -> Result<Money, MissingAddress> {
        self.cost(Cadence::Monthly)
    }

    /// Returns the biannual cost of this [`Quote`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn cost_biannually(&self) -> Result<Money, MissingAddress> {
        self.cost(Cadence::Biannually)
    }

    /// Returns the monthly [`Breakdown`] of this [`Quote`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn breakdown_monthly(&self) -> Result<&Breakdown, MissingAddress> {
        self.breakdown(Cadence::Monthly)
    }

    /// Returns the biannual [`Breakdown`] of this [`Quote`].
    ///
    /// # Errors
    ///
    /// If this [`Quote`] has no [`Address`].
    pub fn breakdown_biannually(&self) -> Result<&Breakdown, MissingAddress> {
        self.breakdown(Cadence::Biannually)
    }
}

/// Attributes of a [`Quote`] its [`Premium`]s depend on.
#[derive(Clone, Debug)]
pub struct Terms {
    /// [`DateTime`] when the policy comes into effect.
    pub effective_at: EffectiveDateTime,

    /// [`Date`] when a previous policy was canceled, if any.
    pub previously_canceled_on: Option<Date>,

    /// Indicator whether the insured property is owned.
    pub is_owned: bool,

    /// [`Address`] of the insured property.
    pub address: Option<Address>,
}

/// [`Premium`]s cached per [`Cadence`].
#[derive(Clone, Debug, Default)]
struct Premiums {
    /// [`Premium`] billed with [`Cadence::Monthly`].
    monthly: OnceLock<Premium>,

    /// [`Premium`] billed with [`Cadence::Biannually`].
    biannually: OnceLock<Premium>,
}

impl Premiums {
    /// Returns the cache slot of the provided [`Cadence`].
    fn of(&self, cadence: Cadence) -> &OnceLock<Premium> {
        match cadence {
            Cadence::Monthly => &self.monthly,
            Cadence::Biannually => &self.biannually,
        }
    }
}

/// Error of pricing a [`Quote`] without an [`Address`].
#[derive(Clone, Debug, Display, Error)]
#[display("`Quote(id: {_0})` has no `Address` to be priced by")]
pub struct MissingAddress(#[error(not(source))] pub Id);

/// ID of a [`Quote`].
///
/// Consists of [`Id::LEN`] characters out of [`Id::ALPHABET`].
#[derive(
    AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(String);

impl Id {
    /// Characters an [`Id`] consists of.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Length of an [`Id`].
    pub const LEN: usize = 10;

    /// Creates a new [`Id`] if the given `id` is valid.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        Self::check(&id).then_some(Self(id))
    }

    /// Generates a new random [`Id`] with the provided [`Rng`].
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(
            (0..Self::LEN)
                .map(|_| {
                    let i = rng.gen_range(0..Self::ALPHABET.len());
                    char::from(Self::ALPHABET[i])
                })
                .collect(),
        )
    }

    /// Checks whether the given `id` is a valid [`Id`].
    fn check(id: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Id`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z0-9]{10}$").expect("valid regex")
        });

        REGEX.is_match(id.as_ref())
    }
}

impl FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `quote::Id`")
    }
}

/// [`DateTime`] when the policy of a [`Quote`] comes into effect.
pub type EffectiveDateTime = DateTimeOf<(Quote, unit::Effect)>;

/// [`DateTime`] when a [`Quote`] was created.
pub type CreationDateTime = DateTimeOf<(Quote, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::{collections::HashSet, ptr};

    use common::{Date, DateTime, Money};
    use rand::{rngs::StdRng, SeedableRng as _};
    use rust_decimal_macros::dec;

    use super::{Id, Quote, Terms};
    use crate::domain::{
        address::{State, ZipCode},
        pricing::{rule, Cadence, Category},
        Address,
    };

    fn quote(state: State, canceled: bool, is_owned: bool) -> Quote {
        Quote::new(
            Id::new("ABCDE12345").unwrap(),
            Terms {
                effective_at: DateTime::now().coerce(),
                previously_canceled_on: canceled
                    .then(|| Date::from_ymd(2021, 9, 1).unwrap()),
                is_owned,
                address: Some(Address::new(
                    ZipCode::new(90210).unwrap(),
                    state,
                )),
            },
            DateTime::now().coerce(),
        )
    }

    #[test]
    fn prices_both_cadences() {
        let q = quote(State::Ca, true, false);

        assert_eq!(q.cost_monthly().unwrap(), Money::new(dec!(13.986)));
        assert_eq!(q.cost_monthly().unwrap().to_string(), "13.99");
        assert_eq!(q.cost_biannually().unwrap().to_string(), "83.92");

        let monthly = q.breakdown_monthly().unwrap();
        assert_eq!(
            monthly.money(Category::Fee, rule::STATE_WITH_VOLCANO).to_string(),
            "2.50",
        );
        let biannually = q.breakdown_biannually().unwrap();
        assert_eq!(
            biannually.money(Category::Fee, rule::CANCELED).to_string(),
            "8.99",
        );
        assert_eq!(
            biannually
                .money(Category::Fee, rule::STATE_WITH_VOLCANO)
                .to_string(),
            "14.99",
        );
    }

    #[test]
    fn caches_premiums() {
        let q = quote(State::Or, false, true);

        let first = q.premium(Cadence::Monthly).unwrap();
        let second = q.premium(Cadence::Monthly).unwrap();
        assert!(ptr::eq(first, second));
        assert!(ptr::eq(
            q.breakdown_monthly().unwrap(),
            q.breakdown_monthly().unwrap(),
        ));

        let biannual = q.premium(Cadence::Biannually).unwrap();
        assert!(!ptr::eq(first, biannual));
        assert_ne!(first.cost, biannual.cost);
    }

    #[test]
    fn drops_cached_premiums_on_change() {
        let mut q = quote(State::Ca, true, false);
        assert_eq!(q.cost_monthly().unwrap().to_string(), "13.99");

        q.set_previously_canceled_on(None);
        q.set_is_owned(true);
        assert_eq!(q.cost_monthly().unwrap().to_string(), "9.49");
        assert_eq!(q.cost_biannually().unwrap().to_string(), "56.94");

        q.set_address(Some(Address::new(
            ZipCode::new(10001).unwrap(),
            State::Ny,
        )));
        assert_eq!(q.cost_monthly().unwrap(), Money::new(dec!(6.993)));
        assert!(!q
            .breakdown_monthly()
            .unwrap()
            .fee(rule::STATE_WITH_VOLCANO)
            .unwrap()
            .applies);
    }

    #[test]
    fn cannot_be_priced_without_address() {
        let mut q = quote(State::Ca, false, false);
        q.set_address(None);

        let err = q.cost_monthly().unwrap_err();
        assert_eq!(err.0, *q.id());
        assert!(q.breakdown_biannually().is_err());
        assert!(q.factors().is_err());
    }

    #[test]
    fn validates_id() {
        assert!(Id::new("FFFFFFFFFF").is_some());
        assert!(Id::new("A1B2C3D4E5").is_some());

        assert!(Id::new("FFFFFFFFF").is_none());
        assert!(Id::new("FFFFFFFFFFF").is_none());
        assert!(Id::new("ffffffffff").is_none());
        assert!(Id::new("FFFFF-FFFF").is_none());
        assert!(Id::new("").is_none());
    }

    #[test]
    fn generates_valid_ids() {
        let mut rng = StdRng::seed_from_u64(42);

        let ids = (0..1000)
            .map(|_| Id::generate(&mut rng))
            .collect::<HashSet<_>>();

        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| Id::new(AsRef::<str>::as_ref(id)).is_some()));
    }
}
