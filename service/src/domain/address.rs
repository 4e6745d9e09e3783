//! [`Address`] definitions.

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;
use xxhash_rust::xxh3;

/// Location of an insured property, describing its risk attributes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Address {
    /// ID of this [`Address`].
    pub id: Id,

    /// [`Hash`] of this [`Address`] used for deduplication.
    ///
    /// [`Hash`]: struct@Hash
    pub hash: Hash,

    /// [`ZipCode`] of this [`Address`].
    pub zip_code: ZipCode,

    /// [`State`] this [`Address`] is located in.
    pub state: State,
}

impl Address {
    /// Creates a new [`Address`] with a random [`Id`].
    #[must_use]
    pub fn new(zip_code: ZipCode, state: State) -> Self {
        Self {
            id: Id::new(),
            hash: Hash::new(zip_code, state),
            zip_code,
            state,
        }
    }

    /// Indicates whether this [`Address`] is located in a [`State`] with
    /// volcanic activity.
    #[must_use]
    pub fn has_volcano(&self) -> bool {
        self.state.has_volcano()
    }
}

/// ID of an [`Address`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Hash of an [`Address`] used for deduplication.
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Hash(Uuid);

impl Hash {
    /// Calculates a new [`Hash`] for an [`Address`].
    ///
    /// [`Hash`]: struct@Hash
    #[must_use]
    pub fn new(zip_code: ZipCode, state: State) -> Self {
        use std::hash::Hasher as _;

        // WARNING: Avoid changing the order of the fields in the hasher,
        //          because it will be a breaking change requiring to migrate
        //          all existing hashes in the database to the new format.
        let mut hasher = xxh3::Xxh3Builder::new().build();
        hasher.write_i32(zip_code.into());
        hasher.write_u8(state.u8());

        Self(Uuid::from_u128(hasher.digest128()))
    }
}

/// Zip code of an [`Address`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ZipCode(i32);

impl ZipCode {
    /// Greatest possible [`ZipCode`].
    pub const MAX: i32 = 99_999;

    /// Creates a new [`ZipCode`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: i32) -> Option<Self> {
        Self::check(code).then_some(Self(code))
    }

    /// Checks whether the given `code` is a valid [`ZipCode`].
    fn check(code: i32) -> bool {
        (0..=Self::MAX).contains(&code)
    }
}

impl FromStr for ZipCode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `ZipCode`")
    }
}

impl TryFrom<i32> for ZipCode {
    type Error = &'static str;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::new(code).ok_or("invalid `ZipCode`")
    }
}

define_kind! {
    #[doc = "US state (or the District of Columbia) of an [`Address`]."]
    enum State {
        #[doc = "Alaska."]
        Ak = 1,
        #[doc = "Alabama."]
        Al = 2,
        #[doc = "Arkansas."]
        Ar = 3,
        #[doc = "Arizona."]
        Az = 4,
        #[doc = "California."]
        Ca = 5,
        #[doc = "Colorado."]
        Co = 6,
        #[doc = "Connecticut."]
        Ct = 7,
        #[doc = "District of Columbia."]
        Dc = 8,
        #[doc = "Delaware."]
        De = 9,
        #[doc = "Florida."]
        Fl = 10,
        #[doc = "Georgia."]
        Ga = 11,
        #[doc = "Hawaii."]
        Hi = 12,
        #[doc = "Iowa."]
        Ia = 13,
        #[doc = "Idaho."]
        Id = 14,
        #[doc = "Illinois."]
        Il = 15,
        #[doc = "Indiana."]
        In = 16,
        #[doc = "Kansas."]
        Ks = 17,
        #[doc = "Kentucky."]
        Ky = 18,
        #[doc = "Louisiana."]
        La = 19,
        #[doc = "Massachusetts."]
        Ma = 20,
        #[doc = "Maryland."]
        Md = 21,
        #[doc = "Maine."]
        Me = 22,
        #[doc = "Michigan."]
        Mi = 23,
        #[doc = "Minnesota."]
        Mn = 24,
        #[doc = "Missouri."]
        Mo = 25,
        #[doc = "Mississippi."]
        Ms = 26,
        #[doc = "Montana."]
        Mt = 27,
        #[doc = "North Carolina."]
        Nc = 28,
        #[doc = "North Dakota."]
        Nd = 29,
        #[doc = "Nebraska."]
        Ne = 30,
        #[doc = "New Hampshire."]
        Nh = 31,
        #[doc = "New Jersey."]
        Nj = 32,
        #[doc = "New Mexico."]
        Nm = 33,
        #[doc = "Nevada."]
        Nv = 34,
        #[doc = "New York."]
        Ny = 35,
        #[doc = "Ohio."]
        Oh = 36,
        #[doc = "Oklahoma."]
        Ok = 37,
        #[doc = "Oregon."]
        Or = 38,
        #[doc = "Pennsylvania."]
        Pa = 39,
        #[doc = "Rhode Island."]
        Ri = 40,
        #[doc = "South Carolina."]
        Sc = 41,
        #[doc = "South Dakota."]
        Sd = 42,
        #[doc = "Tennessee."]
        Tn = 43,
        #[doc = "Texas."]
        Tx = 44,
        #[doc = "Utah."]
        Ut = 45,
        #[doc = "Virginia."]
        Va = 46,
        #[doc = "Vermont."]
        Vt = 47,
        #[doc = "Washington."]
        Wa = 48,
        #[doc = "Wisconsin."]
        Wi = 49,
        #[doc = "West Virginia."]
        Wv = 50,
        #[doc = "Wyoming."]
        Wy = 51,
    }
}

impl State {
    /// [`State`]s having volcanic activity.
    pub const VOLCANIC: &'static [Self] = &[
        Self::Ak,
        Self::Az,
        Self::Ca,
        Self::Co,
        Self::Hi,
        Self::Id,
        Self::Nv,
        Self::Nm,
        Self::Or,
        Self::Ut,
        Self::Wa,
        Self::Wy,
    ];

    /// Indicates whether this [`State`] has volcanic activity.
    #[must_use]
    pub fn has_volcano(self) -> bool {
        Self::VOLCANIC.contains(&self)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::{Address, Hash, State, ZipCode};

    fn zip(code: i32) -> ZipCode {
        ZipCode::new(code).unwrap()
    }

    #[test]
    fn state_from_str() {
        assert_eq!(State::from_str("CA").unwrap(), State::Ca);
        assert_eq!(State::from_str("DC").unwrap(), State::Dc);
        assert_eq!(State::from_str("WY").unwrap(), State::Wy);

        assert!(State::from_str("XX").is_err());
        assert!(State::from_str("PR").is_err());
        assert!(State::from_str("ca").is_err());
        assert!(State::from_str("").is_err());
    }

    #[test]
    fn state_to_string() {
        assert_eq!(State::Ca.to_string(), "CA");
        assert_eq!(State::Nm.to_string(), "NM");
    }

    #[test]
    fn lists_all_states_and_dc() {
        assert_eq!(State::ALL.len(), 51);
        for (n, s) in State::ALL.iter().enumerate() {
            assert_eq!(usize::from(s.u8()), n + 1, "{s} is out of order");
        }
    }

    #[test]
    fn volcanic_states() {
        let volcanic = State::ALL
            .iter()
            .filter(|s| s.has_volcano())
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        assert_eq!(
            volcanic,
            [
                "AK", "AZ", "CA", "CO", "HI", "ID", "NM", "NV", "OR", "UT",
                "WA", "WY",
            ],
        );

        assert!(Address::new(zip(90210), State::Ca).has_volcano());
        assert!(!Address::new(zip(10001), State::Ny).has_volcano());
        assert!(!Address::new(zip(20001), State::Dc).has_volcano());
    }

    #[test]
    fn zip_code() {
        assert!(ZipCode::new(0).is_some());
        assert!(ZipCode::new(2134).is_some());
        assert!(ZipCode::new(99_999).is_some());

        assert!(ZipCode::new(-1).is_none());
        assert!(ZipCode::new(100_000).is_none());

        assert_eq!(ZipCode::from_str("90210").unwrap(), zip(90210));
        assert!(ZipCode::from_str("9021O").is_err());
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            Hash::new(zip(90210), State::Ca),
            Hash::new(zip(90210), State::Ca),
        );
        assert_ne!(
            Hash::new(zip(90210), State::Ca),
            Hash::new(zip(90210), State::Or),
        );
        assert_ne!(
            Hash::new(zip(90210), State::Ca),
            Hash::new(zip(90211), State::Ca),
        );

        let a = Address::new(zip(90210), State::Ca);
        let b = Address::new(zip(90210), State::Ca);
        assert_ne!(a.id, b.id);
        assert_eq!(a.hash, b.hash);
    }
}
