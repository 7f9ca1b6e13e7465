//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::{graphql_object, GraphQLEnum};
use service::{
    command::{self, accept::Offer, cancel_freight},
    domain::{
        self,
        freight::{pricing, Pricing},
        user::{self, Role},
    },
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";

    /// Resolves the driver and the transport company the authenticated
    /// [`domain::User`] acts as a carrier for.
    ///
    /// A company must name one of its drivers, while anyone else acts for
    /// itself unless another driver is named.
    fn carrier(
        me: &domain::User,
        driver_id: Option<api::user::Id>,
    ) -> Result<(user::Id, Option<user::Id>), Error> {
        if me.role == Role::Company {
            driver_id
                .map(|id| (id.into(), Some(me.id)))
                .ok_or_else(|| InputError::DriverRequired.into())
        } else {
            Ok((driver_id.map_or(me.id, Into::into), None))
        }
    }
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Publishes a new `Freight` on the market.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `FORBIDDEN` - the authenticated `User` is not a producer;
    /// - `INVALID_PRICE` - the price is not positive, is under the
    ///                     `priceFloor` or lacks its cargo quantity;
    /// - `INVALID_TRUCK_COUNT` - `requiredTrucks` is not positive;
    /// - `INVALID_DATES` - `deliveryDate` is before `pickupDate`.
    #[tracing::instrument(
        skip_all,
        fields(
            category = ?category,
            gql.name = "createFreight",
            otel.name = Self::SPAN_NAME,
            pickup_date = %pickup_date,
            pricing_kind = ?pricing_kind,
            rate = %rate,
            required_trucks = %required_trucks,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_freight(
        category: api::freight::Category,
        pricing_kind: api::freight::PricingKind,
        rate: Money,
        required_trucks: i32,
        pickup_date: Date,
        delivery_date: Option<Date>,
        distance_km: Option<api::freight::Quantity>,
        weight_tons: Option<api::freight::Quantity>,
        price_floor: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        let me = ctx.current_user().await?;
        let required_trucks = domain::freight::TruckCount::try_from(
            required_trucks,
        )
        .map_err(|_| InputError::InvalidTruckCount.into())
        .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateFreight {
                category: category.into(),
                pricing: Pricing::new(pricing::Kind::from(pricing_kind), rate),
                distance_km: distance_km.map(Into::into),
                weight_tons: weight_tons.map(Into::into),
                required_trucks,
                price_floor,
                pickup_date,
                delivery_date,
                initiator_id: me.id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Grants the location-sharing consent on the `Freight` as the
    /// authenticated driver.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `FORBIDDEN` - the authenticated `User` is not a driver;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            freight_id = %freight_id,
            gql.name = "grantTrackingConsent",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn grant_tracking_consent(
        freight_id: api::freight::Id,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        let me = ctx.current_user().await?;

        let consent = ctx
            .service()
            .execute(command::GrantTrackingConsent {
                freight_id: freight_id.into(),
                initiator_id: me.id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        #[expect(unsafe_code, reason = "consent is granted on existing one")]
        let freight =
            unsafe { api::Freight::new_unchecked(consent.freight_id) };
        Ok(freight)
    }

    /// Takes a truck slot of the `Freight` at its listed price.
    ///
    /// A company takes the slot for one of its drivers, named by `driverId`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `DRIVER_REQUIRED` - a company didn't name a driver;
    /// - `FORBIDDEN` - the authenticated `User` cannot act for the driver;
    /// - `NOT_ELIGIBLE` - the driver cannot take the `Freight`;
    /// - `CONFLICT` - the last slot was taken concurrently;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            driver_id = ?driver_id.map(|id| id.to_string()),
            freight_id = %freight_id,
            gql.name = "acceptFreight",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn accept_freight(
        freight_id: api::freight::Id,
        driver_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        let me = ctx.current_user().await?;
        let (driver_id, company_id) =
            Self::carrier(me, driver_id).map_err(ctx.error())?;

        ctx.service()
            .execute(command::Accept {
                freight_id: freight_id.into(),
                driver_id,
                company_id,
                initiator_id: me.id,
                offer: Offer::ListPrice,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Proposes a per-truck price for the `Freight`.
    ///
    /// A company proposes for one of its drivers, named by `driverId`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `DRIVER_REQUIRED` - a company didn't name a driver;
    /// - `FORBIDDEN` - the authenticated `User` cannot act for the driver;
    /// - `NOT_ELIGIBLE` - the driver cannot bid on the `Freight`;
    /// - `INVALID_PRICE` - the price is not positive or is under the floor;
    /// - `CONFLICT` - the `Freight` left the market concurrently;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            driver_id = ?driver_id.map(|id| id.to_string()),
            freight_id = %freight_id,
            gql.name = "proposePrice",
            otel.name = Self::SPAN_NAME,
            price = %price,
        ),
    )]
    pub async fn propose_price(
        freight_id: api::freight::Id,
        price: Money,
        message: Option<api::proposal::Message>,
        driver_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<api::Proposal, Error> {
        let me = ctx.current_user().await?;
        let (driver_id, _) =
            Self::carrier(me, driver_id).map_err(ctx.error())?;

        ctx.service()
            .execute(command::ProposePrice {
                freight_id: freight_id.into(),
                driver_id,
                initiator_id: me.id,
                price,
                message: message.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Accepts the pending `Proposal`, assigning its driver at the proposed
    /// price.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `NOT_OWNER` - the authenticated `User` doesn't own the `Freight`;
    /// - `NOT_ELIGIBLE` - the driver cannot take the `Freight` anymore;
    /// - `CONFLICT` - the last slot was taken concurrently;
    /// - `PROPOSAL_NOT_EXISTS` - the `Proposal` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "acceptProposal",
            otel.name = Self::SPAN_NAME,
            proposal_id = %proposal_id,
        ),
    )]
    pub async fn accept_proposal(
        proposal_id: api::proposal::Id,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(command::AcceptProposal {
                proposal_id: proposal_id.into(),
                initiator_id: me.id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Rejects the pending `Proposal`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `NOT_OWNER` - the authenticated `User` doesn't own the `Freight`;
    /// - `PROPOSAL_NOT_PENDING` - the `Proposal` is already decided;
    /// - `PROPOSAL_NOT_EXISTS` - the `Proposal` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rejectProposal",
            otel.name = Self::SPAN_NAME,
            proposal_id = %proposal_id,
        ),
    )]
    pub async fn reject_proposal(
        proposal_id: api::proposal::Id,
        ctx: &Context,
    ) -> Result<api::Proposal, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(command::RejectProposal {
                proposal_id: proposal_id.into(),
                initiator_id: me.id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the `Freight` along its lifecycle.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `INVALID_LOCATION` - the `location` coordinates are out of range;
    /// - `INVALID_TRANSITION` - the `Freight` cannot move into the status;
    /// - `FINAL_STATE_LOCKED` - the `Freight` is in a terminal status;
    /// - `FORBIDDEN` - the authenticated `User` role may not make this move;
    /// - `NOT_OWNER` - the authenticated `User` is not a party of the
    ///                 `Freight`;
    /// - `CONFLICT` - the `Freight` was changed concurrently;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            freight_id = %freight_id,
            gql.name = "advanceFreightStatus",
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn advance_freight_status(
        freight_id: api::freight::Id,
        status: api::freight::Status,
        notes: Option<api::history::Notes>,
        location: Option<api::history::LocationInput>,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        let me = ctx.current_user().await?;
        let location = location
            .map(|l| l.validate().ok_or(InputError::InvalidLocation))
            .transpose()
            .map_err(Into::into)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::AdvanceFreightStatus {
                freight_id: freight_id.into(),
                initiator_id: me.id,
                new_status: status.into(),
                notes: notes.map(Into::into),
                location,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Forces the `Freight` into the status, bypassing the lifecycle rules.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `FORBIDDEN` - the authenticated `User` is not an administrator;
    /// - `CONFLICT` - the `Freight` was changed concurrently;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            freight_id = %freight_id,
            gql.name = "overrideFreightStatus",
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn override_freight_status(
        freight_id: api::freight::Id,
        status: api::freight::Status,
        notes: Option<api::history::Notes>,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(command::OverrideFreightStatus {
                freight_id: freight_id.into(),
                initiator_id: me.id,
                new_status: status.into(),
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `Freight`, or asks its producer to, depending on the role
    /// of the authenticated `User` and the `Freight` status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `FORBIDDEN` - the authenticated `User` may not cancel it now;
    /// - `FINAL_STATE_LOCKED` - the `Freight` is in a terminal status;
    /// - `NOT_OWNER` - the authenticated `User` is not a party of the
    ///                 `Freight`;
    /// - `CONFLICT` - the `Freight` was changed concurrently;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            freight_id = %freight_id,
            gql.name = "cancelFreight",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_freight(
        freight_id: api::freight::Id,
        reason: Option<api::history::Notes>,
        ctx: &Context,
    ) -> Result<CancellationOutcome, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(command::CancelFreight {
                freight_id: freight_id.into(),
                initiator_id: me.id,
                reason: reason.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Denies the cancellation asked by the driver of the `Freight`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `NOT_OWNER` - the authenticated `User` doesn't own the `Freight`;
    /// - `NOTHING_TO_DENY` - the `Freight` is not on the road;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            driver_id = %driver_id,
            freight_id = %freight_id,
            gql.name = "denyCancellation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn deny_cancellation(
        freight_id: api::freight::Id,
        driver_id: api::user::Id,
        reason: Option<api::history::Notes>,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(command::DenyCancellation {
                freight_id: freight_id.into(),
                driver_id: driver_id.into(),
                initiator_id: me.id,
                reason: reason.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }

    /// Puts the cancelled `Freight` back on the market.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `NOT_OWNER` - the authenticated `User` doesn't own the `Freight`;
    /// - `NOT_CANCELLED` - the `Freight` is not cancelled;
    /// - `FREIGHT_NOT_EXISTS` - the `Freight` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            freight_id = %freight_id,
            gql.name = "reopenFreight",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reopen_freight(
        freight_id: api::freight::Id,
        ctx: &Context,
    ) -> Result<api::Freight, Error> {
        let me = ctx.current_user().await?;

        ctx.service()
            .execute(command::ReopenFreight {
                freight_id: freight_id.into(),
                initiator_id: me.id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Outcome of a `Freight` cancellation request.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
pub enum CancellationOutcome {
    /// `Freight` is cancelled.
    Cancelled,

    /// `Freight` was cancelled already.
    AlreadyCancelled,

    /// Producer is asked to approve the cancellation.
    ApprovalRequested,

    /// Cancellation is possible through the support only.
    ContactSupport,
}

impl From<cancel_freight::Outcome> for CancellationOutcome {
    fn from(outcome: cancel_freight::Outcome) -> Self {
        use cancel_freight::Outcome as O;

        match outcome {
            O::Cancelled => Self::Cancelled,
            O::AlreadyCancelled => Self::AlreadyCancelled,
            O::ApprovalRequested => Self::ApprovalRequested,
            O::ContactSupport => Self::ContactSupport,
        }
    }
}

define_error! {
    enum InputError {
        #[code = "DRIVER_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Company must name the driver it acts for"]
        DriverRequired,

        #[code = "INVALID_LOCATION"]
        #[status = BAD_REQUEST]
        #[message = "Location coordinates are out of range"]
        InvalidLocation,

        #[code = "INVALID_TRUCK_COUNT"]
        #[status = BAD_REQUEST]
        #[message = "`Freight` must require at least one truck"]
        InvalidTruckCount,
    }
}

impl AsError for command::create_freight::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_DATES"]
                #[status = BAD_REQUEST]
                #[message = "`deliveryDate` must not precede `pickupDate`"]
                DeliveryBeforePickup,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::DeliveryBeforePickup => Error::DeliveryBeforePickup.into(),
            Self::Forbidden(_) => api::PrivilegeError::Forbidden.into(),
            Self::InvalidPrice(e) => return e.try_as_error(),
            Self::NoTrucksRequired => InputError::InvalidTruckCount.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::grant_tracking_consent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::NotDriver(_) => api::PrivilegeError::Forbidden.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::accept::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict(_) => api::FreightError::Conflict.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::Forbidden(_) => api::PrivilegeError::Forbidden.into(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::InvalidPrice(e) => return e.try_as_error(),
            Self::NotEligible(e) => return e.try_as_error(),
            Self::NotOwner(_) => api::PrivilegeError::NotOwner.into(),
            Self::ProposalNotExists(_) => api::ProposalError::NotExists.into(),
            Self::UserNotExists(_) => api::UserError::NotExists.into(),
        })
    }
}

impl AsError for command::propose_price::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict(_) => api::FreightError::Conflict.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::Forbidden(_) => api::PrivilegeError::Forbidden.into(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::InvalidPrice(e) => return e.try_as_error(),
            Self::NotEligible(e) => return e.try_as_error(),
            Self::UserNotExists(_) => api::UserError::NotExists.into(),
        })
    }
}

impl AsError for command::reject_proposal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PROPOSAL_NOT_PENDING"]
                #[status = CONFLICT]
                #[message = "`Proposal` is already decided"]
                NotPending,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::NotOwner(_) => api::PrivilegeError::NotOwner.into(),
            Self::NotPending(_) => {
                crate::Error::from(Error::NotPending).explained(self)
            }
            Self::ProposalNotExists(_) => api::ProposalError::NotExists.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::advance_freight_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict(_) => api::FreightError::Conflict.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::FinalStateLocked(_) => {
                Error::from(api::FreightError::FinalStateLocked)
                    .explained(self)
            }
            Self::Forbidden(_) => api::PrivilegeError::Forbidden.into(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::InvalidTransition { .. } => {
                Error::from(api::FreightError::InvalidTransition)
                    .explained(self)
            }
            Self::MarketOnly(_) => {
                Error::from(api::FreightError::InvalidTransition)
                    .explained(self)
            }
            Self::NotOwner(_) => api::PrivilegeError::NotOwner.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::override_freight_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict(_) => api::FreightError::Conflict.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::NotAdmin(_) => api::PrivilegeError::Forbidden.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::cancel_freight::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Conflict(_) => api::FreightError::Conflict.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::FinalStateLocked(_) => {
                Error::from(api::FreightError::FinalStateLocked)
                    .explained(self)
            }
            Self::Forbidden(_) => api::PrivilegeError::Forbidden.into(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::NotOwner(_) => api::PrivilegeError::NotOwner.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::deny_cancellation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOTHING_TO_DENY"]
                #[status = CONFLICT]
                #[message = "No cancellation awaits approval"]
                NothingToDeny,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::NothingToDeny(_) => {
                crate::Error::from(Error::NothingToDeny).explained(self)
            }
            Self::NotOwner(_) => api::PrivilegeError::NotOwner.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::reopen_freight::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_CANCELLED"]
                #[status = CONFLICT]
                #[message = "Only a cancelled `Freight` may be reopened"]
                NotCancelled,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::FreightNotExists(_) => api::FreightError::NotExists.into(),
            Self::NotCancelled(_) => {
                crate::Error::from(Error::NotCancelled).explained(self)
            }
            Self::NotOwner(_) => api::PrivilegeError::NotOwner.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}
