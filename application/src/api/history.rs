//! [`StatusHistoryEntry`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLInputObject, GraphQLObject, GraphQLScalar};
use service::domain::{self, status_history};
use uuid::Uuid;

use crate::{
    api::{self, freight, scalar},
    Context,
};

/// Audit record of a `Freight` status transition.
#[derive(Clone, Debug, From)]
pub struct StatusHistoryEntry(domain::StatusHistoryEntry);

/// Audit record of a `Freight` status transition.
#[graphql_object(context = Context)]
impl StatusHistoryEntry {
    /// Unique identifier of this `StatusHistoryEntry`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "StatusHistoryEntry.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Status the `Freight` moved into.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "StatusHistoryEntry.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn status(&self) -> freight::Status {
        self.0.status.into()
    }

    /// `User` who made the transition, absent for the system.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "StatusHistoryEntry.changedBy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(unsafe_code, reason = "referenced by existing entry")]
    pub fn changed_by(&self) -> Option<api::User> {
        self.0
            .changed_by
            .map(|id| unsafe { api::User::new_unchecked(id) })
    }

    /// Notes given on the transition.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "StatusHistoryEntry.notes",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn notes(&self) -> Option<Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// Location the transition was reported at.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "StatusHistoryEntry.location",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn location(&self) -> Option<Location> {
        self.0.location.map(|l| Location {
            latitude: l.latitude,
            longitude: l.longitude,
        })
    }

    /// `DateTime` when the transition happened.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "StatusHistoryEntry.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `StatusHistoryEntry`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(status_history::Id)]
#[into(status_history::Id)]
#[graphql(name = "StatusHistoryEntryId", transparent)]
pub struct Id(Uuid);

/// Notes on a `Freight` status transition.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "StatusNotes",
    with = scalar::Via::<status_history::Notes>,
)]
pub struct Notes(status_history::Notes);

/// Geographic location in decimal degrees.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "Location")]
pub struct Location {
    /// Latitude, in `-90..=90`.
    pub latitude: f64,

    /// Longitude, in `-180..=180`.
    pub longitude: f64,
}

/// Geographic location in decimal degrees.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "LocationInput")]
pub struct LocationInput {
    /// Latitude, in `-90..=90`.
    pub latitude: f64,

    /// Longitude, in `-180..=180`.
    pub longitude: f64,
}

impl LocationInput {
    /// Converts this [`LocationInput`] into a [`status_history::Location`],
    /// if the coordinates are valid.
    #[must_use]
    pub fn validate(self) -> Option<status_history::Location> {
        status_history::Location::new(self.latitude, self.longitude)
    }
}
