//! [`Rule`] definitions.

use common::Percent;

/// Name of the [`Rule`]s depending on a previous policy cancellation.
pub const CANCELED: &str = "canceled";

/// Name of the [`Rule`] depending on the volcanic activity in a state.
pub const STATE_WITH_VOLCANO: &str = "state_with_volcano";

/// Name of the [`Rule`] depending on the property ownership.
pub const OWNS_PROPERTY: &str = "owns_property";

/// Rules a premium is priced with, in their evaluation order.
pub const RULES: &RuleSet = &[
    Rule {
        name: CANCELED,
        category: Category::Fee,
        applies: |f| f.previously_canceled,
        multiplier: Percent::whole(15),
    },
    Rule {
        name: STATE_WITH_VOLCANO,
        category: Category::Fee,
        applies: |f| f.has_volcano,
        multiplier: Percent::whole(25),
    },
    Rule {
        name: CANCELED,
        category: Category::Discount,
        applies: |f| !f.previously_canceled,
        multiplier: Percent::whole(10),
    },
    Rule {
        name: OWNS_PROPERTY,
        category: Category::Discount,
        applies: |f| f.is_owned,
        multiplier: Percent::whole(20),
    },
];

/// Ordered set of [`Rule`]s.
pub type RuleSet = [Rule];

/// Fee or discount applied to a base cost when its condition holds.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    /// Name of this [`Rule`], unique within its [`Category`].
    pub name: &'static str,

    /// [`Category`] of this [`Rule`].
    pub category: Category,

    /// Predicate deciding whether this [`Rule`] applies to the [`Factors`].
    pub applies: fn(&Factors) -> bool,

    /// Share of the base cost this [`Rule`] adds or subtracts.
    pub multiplier: Percent,
}

/// Category of a [`Rule`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Category {
    /// Increases the cost.
    Fee,

    /// Decreases the cost.
    Discount,
}

/// Risk factors [`Rule`]s are evaluated against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Factors {
    /// Whether a previous policy was canceled.
    pub previously_canceled: bool,

    /// Whether the insured property is owned by the policyholder.
    pub is_owned: bool,

    /// Whether the insured property is located in a state with volcanic
    /// activity.
    pub has_volcano: bool,
}
