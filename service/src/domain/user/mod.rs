//! [`User`] definitions.

pub mod session;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Platform user: a producer, a driver, a transport company or an
/// administrator.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// [`Name`] of this [`User`].
    pub name: Name,

    /// Indicator whether the profile of this [`User`] passed onboarding.
    pub is_approved: bool,

    /// ID of the transport company [`User`] this [`User`] drives for, if
    /// any.
    pub company_id: Option<Id>,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

impl User {
    /// Indicates whether this [`User`] acts on the shipper side (owns
    /// freights).
    #[must_use]
    pub fn is_shipper(&self) -> bool {
        matches!(self.role, Role::Producer | Role::Admin)
    }

    /// Indicates whether this [`User`] acts on the carrier side.
    #[must_use]
    pub fn is_carrier(&self) -> bool {
        matches!(self.role, Role::Driver | Role::Company)
    }

    /// Indicates whether this [`User`] may bid on freights for the provided
    /// `driver`: either being the `driver` or the company the `driver`
    /// works for.
    #[must_use]
    pub fn may_act_for(&self, driver: &User) -> bool {
        match self.role {
            Role::Driver => self.id == driver.id,
            Role::Company => {
                driver.role == Role::Driver
                    && driver.company_id == Some(self.id)
            }
            Role::Producer | Role::Admin => false,
        }
    }
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
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

/// Name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

define_kind! {
    #[doc = "Role of a [`User`] on the platform."]
    enum Role {
        #[doc = "Shipper publishing and owning freights."]
        #[strum(serialize = "PRODUTOR")]
        Producer = 1,

        #[doc = "Driver carrying freights with their own truck."]
        #[strum(serialize = "MOTORISTA")]
        Driver = 2,

        #[doc = "Transport company operating a fleet of drivers."]
        #[strum(serialize = "TRANSPORTADORA")]
        Company = 3,

        #[doc = "Platform administrator."]
        #[strum(serialize = "ADMIN")]
        Admin = 4,
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::{Id, Name, Role, User};

    fn user(role: Role, company_id: Option<Id>) -> User {
        User {
            id: Id::new(),
            role,
            name: Name::new("Someone").unwrap(),
            is_approved: true,
            company_id,
            created_at: super::CreationDateTime::now(),
        }
    }

    #[test]
    fn acting_for_a_driver() {
        let company = user(Role::Company, None);
        let driver = user(Role::Driver, Some(company.id));
        let stranger = user(Role::Driver, None);

        assert!(driver.may_act_for(&driver));
        assert!(company.may_act_for(&driver));
        assert!(!company.may_act_for(&stranger));
        assert!(!stranger.may_act_for(&driver));
        assert!(!user(Role::Admin, None).may_act_for(&driver));
    }

    #[test]
    fn role_wire_tokens() {
        assert_eq!(Role::Producer.to_string(), "PRODUTOR");
        assert_eq!(Role::Driver.to_string(), "MOTORISTA");
        assert_eq!(Role::Company.to_string(), "TRANSPORTADORA");
        assert_eq!(Role::Admin.to_string(), "ADMIN");

        for role in Role::ALL {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), *role);
        }
        assert!(Role::from_str("PRODUCER").is_err());
    }

    #[test]
    fn name_is_trimmed_and_non_empty() {
        assert!(Name::new("Transportes Silva").is_some());
        assert!(Name::new(" Silva").is_none());
        assert!(Name::new("").is_none());
    }
}
