//! [`Freight`]-related definitions.

use std::future;

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use rust_decimal::Decimal;
use service::{
    domain::{self, freight::pricing, user::Role as UserRole},
    query, Query as _,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A transport order published by a producer.
#[derive(Clone, Debug, From)]
pub struct Freight {
    /// ID of this [`Freight`].
    id: Id,

    /// Underlying [`domain::Freight`].
    freight: OnceCell<domain::Freight>,
}

impl From<domain::Freight> for Freight {
    fn from(freight: domain::Freight) -> Self {
        Self {
            id: freight.id.into(),
            freight: OnceCell::new_with(Some(freight)),
        }
    }
}

impl Freight {
    /// Creates a new [`Freight`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Freight`] with the provided ID exists,
    /// otherwise accessing this [`Freight`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            freight: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Freight`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Freight`] doesn't exist.
    async fn freight(&self, ctx: &Context) -> Result<&domain::Freight, Error> {
        let id = self.id.into();
        self.freight
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::freight::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|f| {
                        future::ready(f.ok_or_else(|| {
                            api::FreightError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Indicates whether the provided [`domain::User`] sees every party of
    /// the provided [`domain::Freight`] rather than only its own share.
    fn sees_all(user: &domain::User, freight: &domain::Freight) -> bool {
        user.role == UserRole::Admin || freight.is_owned_by(user)
    }
}

/// A transport order published by a producer.
#[graphql_object(context = Context)]
impl Freight {
    /// Unique identifier of this `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Current status of this `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.freight(ctx).await?.status.into())
    }

    /// Human-facing label of the current status of this `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.statusLabel",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status_label(&self, ctx: &Context) -> Result<String, Error> {
        Ok(self.freight(ctx).await?.status.label().to_owned())
    }

    /// List bucket this `Freight` belongs to as of today.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.bucket",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn bucket(&self, ctx: &Context) -> Result<Bucket, Error> {
        Ok(self.freight(ctx).await?.bucket(Date::today()).into())
    }

    /// Category of the cargo or service of this `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.category",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn category(&self, ctx: &Context) -> Result<Category, Error> {
        Ok(self.freight(ctx).await?.category.into())
    }

    /// Pricing scheme of this `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.pricingKind",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn pricing_kind(
        &self,
        ctx: &Context,
    ) -> Result<PricingKind, Error> {
        Ok(self.freight(ctx).await?.pricing.kind().into())
    }

    /// Price of this `Freight` as the authenticated `User` may see it.
    ///
    /// The owning producer and administrators see the aggregate cost of all
    /// the trucks, while anyone else sees only the per-truck price.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.price",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn price(&self, ctx: &Context) -> Result<Price, Error> {
        let me = ctx.current_user().await?;
        let freight = self.freight(ctx).await?;
        let assignments = ctx
            .service()
            .execute(query::freight::Assignments::by(freight.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        pricing::visible_price(
            freight,
            &assignments,
            pricing::Viewer::of(me, freight),
        )
            .map(Into::into)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Distance to cover, in kilometers.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.distanceKm",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn distance_km(
        &self,
        ctx: &Context,
    ) -> Result<Option<Quantity>, Error> {
        Ok(self.freight(ctx).await?.distance_km.map(Into::into))
    }

    /// Weight of the cargo, in tons.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.weightTons",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn weight_tons(
        &self,
        ctx: &Context,
    ) -> Result<Option<Quantity>, Error> {
        Ok(self.freight(ctx).await?.weight_tons.map(Into::into))
    }

    /// Number of trucks this `Freight` requires.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.requiredTrucks",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn required_trucks(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.freight(ctx).await?.required_trucks.into())
    }

    /// Number of trucks already assigned to this `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.acceptedTrucks",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn accepted_trucks(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.freight(ctx).await?.accepted_trucks.into())
    }

    /// Regulatory floor of the per-truck price, if any applies.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.priceFloor",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn price_floor(
        &self,
        ctx: &Context,
    ) -> Result<Option<Money>, Error> {
        Ok(self.freight(ctx).await?.price_floor)
    }

    /// `Date` when the cargo is picked up.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.pickupDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn pickup_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.freight(ctx).await?.pickup_date)
    }

    /// `Date` when the cargo is expected to be delivered, if known.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.deliveryDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn delivery_date(
        &self,
        ctx: &Context,
    ) -> Result<Option<Date>, Error> {
        Ok(self.freight(ctx).await?.delivery_date)
    }

    /// Producer `User` owning this `Freight`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.producer",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn producer(&self, ctx: &Context) -> Result<api::User, Error> {
        let id = self.freight(ctx).await?.producer_id;
        #[expect(unsafe_code, reason = "referenced by existing `Freight`")]
        let producer = unsafe { api::User::new_unchecked(id) };
        Ok(producer)
    }

    /// Driver `User` carrying this single-truck `Freight`, if assigned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.driver",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn driver(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::User>, Error> {
        let id = self.freight(ctx).await?.driver_id;
        #[expect(unsafe_code, reason = "referenced by existing `Freight`")]
        let driver = id.map(|id| unsafe { api::User::new_unchecked(id) });
        Ok(driver)
    }

    /// Transport company `User` carrying this single-truck `Freight`, if
    /// assigned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.company",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn company(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::User>, Error> {
        let id = self.freight(ctx).await?.company_id;
        #[expect(unsafe_code, reason = "referenced by existing `Freight`")]
        let company = id.map(|id| unsafe { api::User::new_unchecked(id) });
        Ok(company)
    }

    /// `Assignment`s of this `Freight`.
    ///
    /// Carriers see their own `Assignment`s only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.assignments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn assignments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Assignment>, Error> {
        let me = ctx.current_user().await?;
        let freight = self.freight(ctx).await?;
        let sees_all = Self::sees_all(me, freight);

        Ok(ctx
            .service()
            .execute(query::freight::Assignments::by(freight.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .filter(|a| {
                sees_all
                    || a.driver_id == me.id
                    || a.company_id == Some(me.id)
            })
            .map(Into::into)
            .collect())
    }

    /// `Proposal`s made on this `Freight`.
    ///
    /// Carriers see their own `Proposal`s only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.proposals",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn proposals(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Proposal>, Error> {
        let me = ctx.current_user().await?;
        let freight = self.freight(ctx).await?;
        let sees_all = Self::sees_all(me, freight);

        Ok(ctx
            .service()
            .execute(query::freight::Proposals::by(freight.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .filter(|p| {
                sees_all
                    || p.driver_id == me.id
                    || p.company_id == Some(me.id)
            })
            .map(Into::into)
            .collect())
    }

    /// Status history of this `Freight`, the oldest entry first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.history",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn history(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::StatusHistoryEntry>, Error> {
        ctx.service()
            .execute(query::freight::History::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|h| h.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `Freight` leaves the market automatically,
    /// unless taken before.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.expiresAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn expires_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.freight(ctx).await?.expires_at().coerce())
    }

    /// `DateTime` when this `Freight` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.freight(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Freight` was last modified.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Freight.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.freight(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Freight`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::freight::Id)]
#[into(domain::freight::Id)]
#[graphql(name = "FreightId", transparent)]
pub struct Id(Uuid);

/// Decimal quantity of a `Freight` cargo.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "Quantity", with = scalar::Via::<Decimal>)]
pub struct Quantity(Decimal);

/// Price of a `Freight` as the authenticated `User` may see it.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "FreightPrice")]
pub struct Price {
    /// Amount to display.
    pub display: Money,

    /// Amount due on settlement, if anything is agreed.
    pub payable: Option<Money>,
}

impl From<pricing::Price> for Price {
    fn from(price: pricing::Price) -> Self {
        let pricing::Price { display, payable } = price;
        Self { display, payable }
    }
}

/// `Freight`s visible to the authenticated `User`, grouped by list buckets.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "FreightBoard", context = Context)]
pub struct Board {
    /// `Freight`s on the market.
    pub open: Vec<Freight>,

    /// `Freight`s being executed.
    pub active: Vec<Freight>,

    /// Assigned `Freight`s waiting for their pickup date.
    pub scheduled: Vec<Freight>,

    /// `Freight`s in a terminal status.
    pub completed: Vec<Freight>,
}

impl From<service::read::freight::Board> for Board {
    fn from(board: service::read::freight::Board) -> Self {
        let into = |list: Vec<domain::Freight>| {
            list.into_iter().map(Into::into).collect()
        };
        Self {
            open: into(board.open),
            active: into(board.active),
            scheduled: into(board.scheduled),
            completed: into(board.completed),
        }
    }
}

/// Status of a `Freight`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "FreightStatus")]
pub enum Status {
    /// Published and open for bids.
    Open,

    /// At least one price proposal was made.
    InNegotiation,

    /// All the required trucks are assigned.
    Accepted,

    /// Cargo is being loaded.
    Loading,

    /// Cargo is loaded.
    Loaded,

    /// Cargo is on the way.
    InTransit,

    /// Driver reported the delivery, the producer confirmation is awaited.
    DeliveredPendingConfirmation,

    /// Delivery is confirmed.
    Delivered,

    /// Freight is settled.
    Completed,

    /// Freight is cancelled.
    Cancelled,

    /// Freight is rejected by the platform.
    Rejected,
}

impl From<domain::freight::Status> for Status {
    fn from(status: domain::freight::Status) -> Self {
        use domain::freight::Status as S;

        match status {
            S::Open => Self::Open,
            S::InNegotiation => Self::InNegotiation,
            S::Accepted => Self::Accepted,
            S::Loading => Self::Loading,
            S::Loaded => Self::Loaded,
            S::InTransit => Self::InTransit,
            S::DeliveredPendingConfirmation => {
                Self::DeliveredPendingConfirmation
            }
            S::Delivered => Self::Delivered,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
            S::Rejected => Self::Rejected,
        }
    }
}

impl From<Status> for domain::freight::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Open => Self::Open,
            Status::InNegotiation => Self::InNegotiation,
            Status::Accepted => Self::Accepted,
            Status::Loading => Self::Loading,
            Status::Loaded => Self::Loaded,
            Status::InTransit => Self::InTransit,
            Status::DeliveredPendingConfirmation => {
                Self::DeliveredPendingConfirmation
            }
            Status::Delivered => Self::Delivered,
            Status::Completed => Self::Completed,
            Status::Cancelled => Self::Cancelled,
            Status::Rejected => Self::Rejected,
        }
    }
}

/// List bucket of a `Freight`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "FreightBucket")]
pub enum Bucket {
    /// On the market.
    Open,

    /// Being executed.
    Active,

    /// Assigned and waiting for its pickup date.
    Scheduled,

    /// In a terminal status.
    Completed,
}

impl From<domain::freight::Bucket> for Bucket {
    fn from(bucket: domain::freight::Bucket) -> Self {
        use domain::freight::Bucket as B;

        match bucket {
            B::Open => Self::Open,
            B::Active => Self::Active,
            B::Scheduled => Self::Scheduled,
            B::Completed => Self::Completed,
        }
    }
}

/// Category of the cargo or service of a `Freight`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "FreightCategory")]
pub enum Category {
    /// Urgent courier-like delivery.
    Express,

    /// Live animals.
    Livestock,

    /// Temperature-controlled cargo.
    Refrigerated,

    /// General cargo.
    General,

    /// Bulk grain.
    Grain,

    /// Transport-related service.
    Service,
}

impl From<domain::freight::Category> for Category {
    fn from(category: domain::freight::Category) -> Self {
        use domain::freight::Category as C;

        match category {
            C::Express => Self::Express,
            C::Livestock => Self::Livestock,
            C::Refrigerated => Self::Refrigerated,
            C::General => Self::General,
            C::Grain => Self::Grain,
            C::Service => Self::Service,
        }
    }
}

impl From<Category> for domain::freight::Category {
    fn from(category: Category) -> Self {
        match category {
            Category::Express => Self::Express,
            Category::Livestock => Self::Livestock,
            Category::Refrigerated => Self::Refrigerated,
            Category::General => Self::General,
            Category::Grain => Self::Grain,
            Category::Service => Self::Service,
        }
    }
}

/// Pricing scheme of a `Freight`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "FreightPricingKind")]
pub enum PricingKind {
    /// Listed rate is the per-truck price.
    Fixed,

    /// Per-truck price is the rate multiplied by the distance.
    PerKm,

    /// Per-truck price is the rate multiplied by the weight.
    PerTon,
}

impl From<pricing::Kind> for PricingKind {
    fn from(kind: pricing::Kind) -> Self {
        match kind {
            pricing::Kind::Fixed => Self::Fixed,
            pricing::Kind::PerKm => Self::PerKm,
            pricing::Kind::PerTon => Self::PerTon,
        }
    }
}

impl From<PricingKind> for pricing::Kind {
    fn from(kind: PricingKind) -> Self {
        match kind {
            PricingKind::Fixed => Self::Fixed,
            PricingKind::PerKm => Self::PerKm,
            PricingKind::PerTon => Self::PerTon,
        }
    }
}
