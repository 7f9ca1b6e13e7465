//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{domain::user::Role, query, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        Ok(ctx.current_user().await?.clone().into())
    }

    /// Returns the `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        _ = ctx.current_user().await?;

        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Freight` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "freight",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn freight(
        id: api::freight::Id,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        _ = ctx.current_user().await?;

        ctx.service()
            .execute(query::freight::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::FreightError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Freight`s visible to the authenticated `User`, grouped
    /// by list buckets.
    ///
    /// Producers see their own `Freight`s, administrators see everything,
    /// while drivers and companies see the `Freight`s they are assigned to
    /// along with the open market.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "freights",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn freights(ctx: &Context) -> Result<api::freight::Board, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(query::freights::Visible {
                viewer: me.clone(),
                today: Date::today(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Proposal` with the specified ID.
    ///
    /// Only the owner of the `Freight`, an administrator or the proposing
    /// carrier may see a `Proposal`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `PROPOSAL_NOT_EXISTS` - the `Proposal` with the specified ID does
    ///                           not exist or is not visible.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "proposal",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn proposal(
        id: api::proposal::Id,
        ctx: &Context,
    ) -> Result<api::Proposal, Error> {
        let me = ctx.current_user().await?;

        let proposal = ctx
            .service()
            .execute(query::proposal::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::ProposalError::NotExists.into())
            .map_err(ctx.error())?;

        let is_party = me.role == Role::Admin
            || proposal.driver_id == me.id
            || proposal.company_id == Some(me.id)
            || ctx
                .service()
                .execute(query::freight::ById::by(proposal.freight_id))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())?
                .is_some_and(|f| f.is_owned_by(me));
        if !is_party {
            return Err(api::ProposalError::NotExists.into())
                .map_err(ctx.error());
        }

        Ok(proposal.into())
    }
}
