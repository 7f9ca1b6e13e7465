//! [`Proposal`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Freight, User};
use crate::domain::{freight, user};

/// Counter-offer of a driver on a [`Freight`], preceding an assignment.
///
/// There is at most one [`Proposal`] per driver per [`Freight`].
#[derive(Clone, Debug)]
pub struct Proposal {
    /// ID of this [`Proposal`].
    pub id: Id,

    /// ID of the [`Freight`] this [`Proposal`] is for.
    pub freight_id: freight::Id,

    /// ID of the driver [`User`] proposing.
    pub driver_id: user::Id,

    /// ID of the transport company [`User`] the driver works for, if any.
    pub company_id: Option<user::Id>,

    /// [`Status`] of this [`Proposal`].
    pub status: Status,

    /// Proposed per-truck price.
    pub proposed_price: Money,

    /// Optional [`Message`] to the producer.
    pub message: Option<Message>,

    /// [`DateTime`] when this [`Proposal`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Proposal`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Proposal {
    /// Indicates whether this [`Proposal`] still waits for a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    /// Moves this [`Proposal`] into the provided [`Status`].
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.updated_at = ModificationDateTime::now();
    }
}

/// Decision upon a [`Proposal`], written only while it's still
/// [`Status::Pending`].
#[derive(Clone, Copy, Debug)]
pub struct Decision {
    /// ID of the [`Proposal`] to decide upon.
    pub proposal_id: Id,

    /// [`Status`] to move the [`Proposal`] into.
    pub status: Status,
}

impl Decision {
    /// Applies this [`Decision`] to the provided [`Proposal`] if it's still
    /// pending.
    ///
    /// Returns `false` and leaves the [`Proposal`] untouched otherwise.
    pub fn apply_to(&self, proposal: &mut Proposal) -> bool {
        if proposal.id != self.proposal_id || !proposal.is_pending() {
            return false;
        }
        proposal.set_status(self.status);
        true
    }
}

/// ID of a [`Proposal`].
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

/// Message attached to a [`Proposal`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Message(String);

impl Message {
    /// Creates a new [`Message`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let len = text.trim().chars().count();
        (len > 0 && len <= 1000).then_some(Self(text))
    }
}

impl FromStr for Message {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Message`")
    }
}

define_kind! {
    #[doc = "Status of a [`Proposal`]."]
    enum Status {
        #[doc = "Waiting for the producer decision."]
        Pending = 1,

        #[doc = "Accepted by the producer and turned into an assignment."]
        Accepted = 2,

        #[doc = "Rejected by the producer."]
        Rejected = 3,

        #[doc = "Withdrawn or superseded."]
        Cancelled = 4,
    }
}

/// [`DateTime`] when a [`Proposal`] was created.
pub type CreationDateTime = DateTimeOf<(Proposal, unit::Creation)>;

/// [`DateTime`] when a [`Proposal`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Proposal, unit::Modification)>;
