//! [`Assignment`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, Context};

/// Binding of a truck to a `Freight`.
#[derive(Clone, Debug, From)]
pub struct Assignment(domain::Assignment);

/// Binding of a truck to a `Freight`.
#[graphql_object(context = Context)]
impl Assignment {
    /// Unique identifier of this `Assignment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `Freight` this `Assignment` binds to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.freight",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(unsafe_code, reason = "referenced by existing `Assignment`")]
    pub fn freight(&self) -> api::Freight {
        unsafe { api::Freight::new_unchecked(self.0.freight_id) }
    }

    /// Driver `User` carrying the truck.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.driver",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(unsafe_code, reason = "referenced by existing `Assignment`")]
    pub fn driver(&self) -> api::User {
        unsafe { api::User::new_unchecked(self.0.driver_id) }
    }

    /// Transport company `User` the driver works for, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.company",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(unsafe_code, reason = "referenced by existing `Assignment`")]
    pub fn company(&self) -> Option<api::User> {
        self.0
            .company_id
            .map(|id| unsafe { api::User::new_unchecked(id) })
    }

    /// Status of this `Assignment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Price agreed for the truck, overriding the listed one.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.agreedPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn agreed_price(&self) -> Money {
        self.0.agreed_price
    }

    /// `DateTime` when this `Assignment` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Assignment` was last modified.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Assignment.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of an `Assignment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::assignment::Id)]
#[into(domain::assignment::Id)]
#[graphql(name = "AssignmentId", transparent)]
pub struct Id(Uuid);

/// Status of an `Assignment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "AssignmentStatus")]
pub enum Status {
    /// Waiting for a confirmation.
    Pending,

    /// Truck is bound to the `Freight`.
    Accepted,

    /// Binding is withdrawn.
    Cancelled,

    /// `Freight` is delivered.
    Completed,
}

impl From<domain::assignment::Status> for Status {
    fn from(status: domain::assignment::Status) -> Self {
        use domain::assignment::Status as S;

        match status {
            S::Pending => Self::Pending,
            S::Accepted => Self::Accepted,
            S::Cancelled => Self::Cancelled,
            S::Completed => Self::Completed,
        }
    }
}
