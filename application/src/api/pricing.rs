//! Pricing-related definitions.

use derive_more::From;
use juniper::{graphql_object, GraphQLEnum};
use service::domain::pricing;

use crate::{api, Context};

/// Billing cadence of a policy.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
pub enum PaymentFrequency {
    /// Billed every month.
    Monthly,

    /// Billed every six months.
    Biannually,
}

impl From<pricing::Cadence> for PaymentFrequency {
    fn from(cadence: pricing::Cadence) -> Self {
        use pricing::Cadence as C;
        match cadence {
            C::Monthly => Self::Monthly,
            C::Biannually => Self::Biannually,
        }
    }
}

impl From<PaymentFrequency> for pricing::Cadence {
    fn from(frequency: PaymentFrequency) -> Self {
        use PaymentFrequency as F;
        match frequency {
            F::Monthly => Self::Monthly,
            F::Biannually => Self::Biannually,
        }
    }
}

/// Structured explanation of a policy cost.
#[derive(Clone, Debug, From)]
pub struct Breakdown(pricing::Breakdown);

/// Structured explanation of a policy cost.
#[graphql_object(name = "PriceBreakdown", context = Context)]
impl Breakdown {
    /// Fees, added to the base cost when applicable.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "PriceBreakdown.fees",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn fees(&self) -> Vec<Modifier> {
        self.0.fees.iter().copied().map(Modifier).collect()
    }

    /// Discounts, subtracted from the base cost when applicable.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "PriceBreakdown.discounts",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn discounts(&self) -> Vec<Modifier> {
        self.0.discounts.iter().copied().map(Modifier).collect()
    }
}

/// Single fee or discount of a policy cost.
#[derive(Clone, Copy, Debug)]
pub struct Modifier(pricing::Modifier);

/// Single fee or discount of a policy cost.
#[graphql_object(name = "PriceModifier", context = Context)]
impl Modifier {
    /// Name of this `PriceModifier`, unique within its category.
    pub fn name(&self) -> &str {
        self.0.name
    }

    /// Indicator whether this `PriceModifier` applies to the policy.
    pub fn applies(&self) -> bool {
        self.0.applies
    }

    /// Share of the base cost this `PriceModifier` stands for (`0.15` for
    /// `15%`).
    pub fn multiplier(&self) -> f64 {
        self.0.multiplier.ratio_f64()
    }

    /// Amount of US dollars this `PriceModifier` adds or subtracts, in full
    /// precision.
    ///
    /// Always `0` when this `PriceModifier` doesn't apply.
    pub fn money(&self) -> f64 {
        self.0.money.to_f64()
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Money, Percent};
    use service::domain::pricing::{self, Cadence};

    use super::{Modifier, PaymentFrequency};

    #[test]
    fn maps_payment_frequency_both_ways() {
        for cadence in Cadence::ALL {
            assert_eq!(
                Cadence::from(PaymentFrequency::from(*cadence)),
                *cadence,
            );
        }
    }

    #[test]
    fn passes_modifier_money_unrounded() {
        let modifier = Modifier(pricing::Modifier {
            name: pricing::rule::CANCELED,
            applies: true,
            multiplier: Percent::whole(15),
            money: Money::from_str("1.4985").unwrap(),
        });

        assert!((modifier.money() - 1.4985).abs() < 1e-9);
        assert!((modifier.multiplier() - 0.15).abs() < 1e-9);
    }
}
