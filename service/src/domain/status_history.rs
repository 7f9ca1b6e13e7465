//! [`StatusHistoryEntry`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Freight, User};
use crate::domain::{
    freight::{self, Status},
    user,
};

/// Append-only audit record of a [`Freight`] [`Status`] transition.
#[derive(Clone, Debug)]
pub struct StatusHistoryEntry {
    /// ID of this [`StatusHistoryEntry`].
    pub id: Id,

    /// ID of the [`Freight`] transitioned.
    pub freight_id: freight::Id,

    /// [`Status`] the [`Freight`] transitioned into.
    pub status: Status,

    /// ID of the [`User`] who caused the transition.
    ///
    /// [`None`] for transitions performed by the system itself.
    pub changed_by: Option<user::Id>,

    /// Free-form [`Notes`] on the transition.
    pub notes: Option<Notes>,

    /// [`Location`] where the transition was reported from.
    pub location: Option<Location>,

    /// [`DateTime`] when this [`StatusHistoryEntry`] was created.
    pub created_at: CreationDateTime,
}

impl StatusHistoryEntry {
    /// Creates a new [`StatusHistoryEntry`] recorded at the current moment.
    #[must_use]
    pub fn new(
        freight_id: freight::Id,
        status: Status,
        changed_by: Option<user::Id>,
        notes: Option<Notes>,
    ) -> Self {
        Self {
            id: Id::new(),
            freight_id,
            status,
            changed_by,
            notes,
            location: None,
            created_at: CreationDateTime::now(),
        }
    }
}

/// ID of a [`StatusHistoryEntry`].
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

/// Notes on a [`Freight`] [`Status`] transition.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates new [`Notes`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let len = text.trim().chars().count();
        (len > 0 && len <= 2000).then_some(Self(text))
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Notes`")
    }
}

/// Geographic location in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    /// Latitude, in `-90..=90`.
    pub latitude: f64,

    /// Longitude, in `-180..=180`.
    pub longitude: f64,
}

impl Location {
    /// Creates a new [`Location`] if the given coordinates are valid.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        ((-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude))
        .then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// [`DateTime`] when a [`StatusHistoryEntry`] was created.
pub type CreationDateTime = DateTimeOf<(StatusHistoryEntry, unit::Creation)>;
