//! [`Assignment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Freight, User};
use crate::domain::{freight, user};

/// Binding of one truck (driver) to one [`Freight`].
#[derive(Clone, Debug)]
pub struct Assignment {
    /// ID of this [`Assignment`].
    pub id: Id,

    /// ID of the [`Freight`] this [`Assignment`] is for.
    pub freight_id: freight::Id,

    /// ID of the driver [`User`] assigned.
    pub driver_id: user::Id,

    /// ID of the transport company [`User`] the driver works for, if any.
    pub company_id: Option<user::Id>,

    /// [`Status`] of this [`Assignment`].
    pub status: Status,

    /// Per-truck price agreed for this [`Assignment`].
    ///
    /// The only source of truth of what the driver is owed: it is never
    /// recomputed from the [`Freight`] listing.
    pub agreed_price: Money,

    /// [`DateTime`] when this [`Assignment`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Assignment`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Assignment {
    /// Indicates whether this [`Assignment`] counts towards the cost of its
    /// [`Freight`].
    #[must_use]
    pub fn is_billable(&self) -> bool {
        matches!(self.status, Status::Accepted | Status::Completed)
    }

    /// Moves this [`Assignment`] into the provided [`Status`].
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.updated_at = ModificationDateTime::now();
    }
}

/// ID of an [`Assignment`].
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
    PartialEq,
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

define_kind! {
    #[doc = "Status of an [`Assignment`]."]
    enum Status {
        #[doc = "Waiting for a confirmation."]
        Pending = 1,

        #[doc = "Truck is bound to the freight."]
        Accepted = 2,

        #[doc = "Binding is withdrawn."]
        Cancelled = 3,

        #[doc = "Freight is delivered."]
        Completed = 4,
    }
}

/// [`DateTime`] when an [`Assignment`] was created.
pub type CreationDateTime = DateTimeOf<(Assignment, unit::Creation)>;

/// [`DateTime`] when an [`Assignment`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Assignment, unit::Modification)>;
