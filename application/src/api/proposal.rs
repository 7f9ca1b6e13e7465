//! [`Proposal`]-related definitions.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// Price a driver proposes for a `Freight`.
#[derive(Clone, Debug, From)]
pub struct Proposal(domain::Proposal);

/// Price a driver proposes for a `Freight`.
#[graphql_object(context = Context)]
impl Proposal {
    /// Unique identifier of this `Proposal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `Freight` this `Proposal` is made on.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.freight",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(unsafe_code, reason = "referenced by existing `Proposal`")]
    pub fn freight(&self) -> api::Freight {
        unsafe { api::Freight::new_unchecked(self.0.freight_id) }
    }

    /// Driver `User` who would carry the `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.driver",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(unsafe_code, reason = "referenced by existing `Proposal`")]
    pub fn driver(&self) -> api::User {
        unsafe { api::User::new_unchecked(self.0.driver_id) }
    }

    /// Transport company `User` the driver works for, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.company",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(unsafe_code, reason = "referenced by existing `Proposal`")]
    pub fn company(&self) -> Option<api::User> {
        self.0
            .company_id
            .map(|id| unsafe { api::User::new_unchecked(id) })
    }

    /// Status of this `Proposal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Proposed per-truck price.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.proposedPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn proposed_price(&self) -> Money {
        self.0.proposed_price
    }

    /// Message attached to this `Proposal`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.message",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn message(&self) -> Option<Message> {
        self.0.message.clone().map(Into::into)
    }

    /// `DateTime` when this `Proposal` was made.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Proposal` was last modified.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Proposal.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `Proposal`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::proposal::Id)]
#[into(domain::proposal::Id)]
#[graphql(name = "ProposalId", transparent)]
pub struct Id(Uuid);

/// Message attached to a `Proposal`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ProposalMessage",
    with = scalar::Via::<domain::proposal::Message>,
)]
pub struct Message(domain::proposal::Message);

/// Status of a `Proposal`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "ProposalStatus")]
pub enum Status {
    /// Waiting for the producer decision.
    Pending,

    /// Accepted by the producer.
    Accepted,

    /// Rejected by the producer.
    Rejected,

    /// Withdrawn or superseded.
    Cancelled,
}

impl From<domain::proposal::Status> for Status {
    fn from(status: domain::proposal::Status) -> Self {
        use domain::proposal::Status as S;

        match status {
            S::Pending => Self::Pending,
            S::Accepted => Self::Accepted,
            S::Rejected => Self::Rejected,
            S::Cancelled => Self::Cancelled,
        }
    }
}
