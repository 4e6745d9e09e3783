//! Premium pricing definitions.
//!
//! A [`Premium`] is calculated from a base cost of a [`Cadence`] by applying
//! every [`Rule`] of a [`RuleSet`]: applicable fees add their share of the
//! base cost, applicable discounts subtract it. Shares are never compounded,
//! so the order of [`Rule`]s affects only the order of [`Breakdown`] entries.

pub mod rule;

use common::{define_kind, Money, Percent};

pub use self::rule::{Category, Factors, Rule, RuleSet, RULES};

define_kind! {
    #[doc = "Billing cadence of a policy."]
    enum Cadence {
        #[doc = "Billed every month."]
        Monthly = 1,

        #[doc = "Billed every six months."]
        Biannually = 2,
    }
}

impl Cadence {
    /// Returns the base cost of a policy billed with this [`Cadence`].
    #[must_use]
    pub const fn base_cost(self) -> Money {
        match self {
            Self::Monthly => Money::from_cents(999),
            Self::Biannually => Money::from_cents(5994),
        }
    }
}

/// Calculated premium of a policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Premium {
    /// Final cost, with all the applicable fees and discounts.
    pub cost: Money,

    /// [`Breakdown`] of the fees and discounts.
    pub breakdown: Breakdown,
}

/// Fees and discounts a [`Premium`] consists of.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Breakdown {
    /// Fee [`Modifier`]s in their evaluation order.
    pub fees: Vec<Modifier>,

    /// Discount [`Modifier`]s in their evaluation order.
    pub discounts: Vec<Modifier>,
}

impl Breakdown {
    /// Returns the fee [`Modifier`] with the provided `name`, if any.
    #[must_use]
    pub fn fee(&self, name: &str) -> Option<&Modifier> {
        self.fees.iter().find(|m| m.name == name)
    }

    /// Returns the discount [`Modifier`] with the provided `name`, if any.
    #[must_use]
    pub fn discount(&self, name: &str) -> Option<&Modifier> {
        self.discounts.iter().find(|m| m.name == name)
    }

    /// Returns the [`Money`] of the [`Modifier`] with the provided `name` in
    /// the provided [`Category`].
    ///
    /// Missing and non-applicable [`Modifier`]s are worth [`Money::ZERO`].
    #[must_use]
    pub fn money(&self, category: Category, name: &str) -> Money {
        match category {
            Category::Fee => self.fee(name),
            Category::Discount => self.discount(name),
        }
        .map_or(Money::ZERO, |m| m.money)
    }
}

/// Outcome of a single [`Rule`] evaluation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Modifier {
    /// Name of the evaluated [`Rule`].
    pub name: &'static str,

    /// Whether the [`Rule`] applies.
    pub applies: bool,

    /// [`Rule`] multiplier.
    pub multiplier: Percent,

    /// Amount added or subtracted, [`Money::ZERO`] if not applicable.
    pub money: Money,
}

/// Calculates the [`Premium`] for the provided `base` cost.
#[must_use]
pub fn calculate(base: Money, factors: &Factors, rules: &RuleSet) -> Premium {
    let mut cost = base;
    let mut breakdown = Breakdown::default();

    for rule in rules {
        let applies = (rule.applies)(factors);
        let money = if applies {
            base * rule.multiplier
        } else {
            Money::ZERO
        };
        let modifier = Modifier {
            name: rule.name,
            applies,
            multiplier: rule.multiplier,
            money,
        };

        match rule.category {
            Category::Fee => {
                cost += money;
                breakdown.fees.push(modifier);
            }
            Category::Discount => {
                cost -= money;
                breakdown.discounts.push(modifier);
            }
        }
    }

    Premium { cost, breakdown }
}

#[cfg(test)]
mod spec {
    use common::{Money, Percent};
    use rust_decimal_macros::dec;

    use super::{
        calculate, rule, Breakdown, Cadence, Category, Factors, Modifier,
        Rule, RULES,
    };

    const CANCELED_IN_VOLCANIC_STATE: Factors = Factors {
        previously_canceled: true,
        is_owned: false,
        has_volcano: true,
    };

    const OWNED_IN_VOLCANIC_STATE: Factors = Factors {
        previously_canceled: false,
        is_owned: true,
        has_volcano: true,
    };

    fn modifier(
        name: &'static str,
        applies: bool,
        multiplier: u8,
        money: Money,
    ) -> Modifier {
        Modifier {
            name,
            applies,
            multiplier: Percent::whole(multiplier),
            money,
        }
    }

    #[test]
    fn base_costs() {
        assert_eq!(Cadence::Monthly.base_cost(), Money::new(dec!(9.99)));
        assert_eq!(Cadence::Biannually.base_cost(), Money::new(dec!(59.94)));
    }

    #[test]
    fn canceled_in_volcanic_state() {
        let premium = calculate(
            Cadence::Monthly.base_cost(),
            &CANCELED_IN_VOLCANIC_STATE,
            RULES,
        );

        assert_eq!(premium.cost, Money::new(dec!(13.986)));
        assert_eq!(premium.cost.to_string(), "13.99");
        assert_eq!(
            premium.breakdown,
            Breakdown {
                fees: vec![
                    modifier(
                        rule::CANCELED,
                        true,
                        15,
                        Money::new(dec!(1.4985)),
                    ),
                    modifier(
                        rule::STATE_WITH_VOLCANO,
                        true,
                        25,
                        Money::new(dec!(2.4975)),
                    ),
                ],
                discounts: vec![
                    modifier(rule::CANCELED, false, 10, Money::ZERO),
                    modifier(rule::OWNS_PROPERTY, false, 20, Money::ZERO),
                ],
            },
        );
        assert_eq!(
            premium
                .breakdown
                .fee(rule::CANCELED)
                .map(|m| m.money.to_string()),
            Some("1.50".to_owned()),
        );
        assert_eq!(
            premium
                .breakdown
                .fee(rule::STATE_WITH_VOLCANO)
                .map(|m| m.money.to_string()),
            Some("2.50".to_owned()),
        );
    }

    #[test]
    fn owned_in_volcanic_state() {
        let premium = calculate(
            Cadence::Monthly.base_cost(),
            &OWNED_IN_VOLCANIC_STATE,
            RULES,
        );

        assert_eq!(premium.cost, Money::new(dec!(9.4905)));
        assert_eq!(premium.cost.to_string(), "9.49");
        assert_eq!(
            premium.breakdown.money(Category::Discount, rule::CANCELED),
            Money::new(dec!(0.999)),
        );
        assert_eq!(
            premium.breakdown.money(Category::Discount, rule::OWNS_PROPERTY),
            Money::new(dec!(1.998)),
        );
        assert_eq!(
            premium.breakdown.money(Category::Fee, rule::CANCELED),
            Money::ZERO,
        );
    }

    #[test]
    fn biannual_cadence() {
        let premium = calculate(
            Cadence::Biannually.base_cost(),
            &CANCELED_IN_VOLCANIC_STATE,
            RULES,
        );

        assert_eq!(premium.cost, Money::new(dec!(83.916)));
        assert_eq!(premium.cost.to_string(), "83.92");

        let premium = calculate(
            Cadence::Biannually.base_cost(),
            &OWNED_IN_VOLCANIC_STATE,
            RULES,
        );

        assert_eq!(premium.cost, Money::new(dec!(56.943)));
        assert_eq!(premium.cost.to_string(), "56.94");
    }

    #[test]
    fn no_applicable_rules_keep_base_cost() {
        let factors = Factors {
            previously_canceled: true,
            is_owned: false,
            has_volcano: false,
        };
        let premium = calculate(Money::new(dec!(9.99)), &factors, RULES);

        assert_eq!(premium.cost, Money::new(dec!(11.4885)));

        let premium = calculate(Money::new(dec!(9.99)), &factors, &[]);

        assert_eq!(premium.cost, Money::new(dec!(9.99)));
        assert_eq!(premium.breakdown, Breakdown::default());
    }

    #[test]
    fn zero_base_cost() {
        let premium =
            calculate(Money::ZERO, &CANCELED_IN_VOLCANIC_STATE, RULES);

        assert_eq!(premium.cost, Money::ZERO);
        assert!(premium
            .breakdown
            .fees
            .iter()
            .chain(&premium.breakdown.discounts)
            .all(|m| m.money == Money::ZERO));
        assert!(premium.breakdown.fees.iter().all(|m| m.applies));
    }

    #[test]
    fn rule_order_does_not_affect_cost() {
        let factors = [
            CANCELED_IN_VOLCANIC_STATE,
            OWNED_IN_VOLCANIC_STATE,
            Factors::default(),
            Factors {
                previously_canceled: true,
                is_owned: true,
                has_volcano: true,
            },
        ];

        for f in &factors {
            let expected = calculate(Money::new(dec!(9.99)), f, RULES).cost;

            let mut rules = RULES.to_vec();
            for _ in 0..rules.len() {
                rules.rotate_left(1);
                assert_eq!(
                    calculate(Money::new(dec!(9.99)), f, &rules).cost,
                    expected,
                );

                let reversed = rules.iter().rev().copied().collect::<Vec<_>>();
                assert_eq!(
                    calculate(Money::new(dec!(9.99)), f, &reversed).cost,
                    expected,
                );
            }
        }
    }

    #[test]
    fn evaluates_custom_rules() {
        let rules = [Rule {
            name: "flood_zone",
            category: Category::Fee,
            applies: |_| true,
            multiplier: Percent::whole(50),
        }];

        let premium =
            calculate(Money::new(dec!(10)), &Factors::default(), &rules);

        assert_eq!(premium.cost, Money::new(dec!(15)));
        assert_eq!(
            premium.breakdown.fee("flood_zone").map(|m| m.money),
            Some(Money::new(dec!(5))),
        );
        assert!(premium.breakdown.discounts.is_empty());
    }
}
