//! [`Freight`] definitions.

pub mod cancellation;
pub mod classification;
pub mod eligibility;
pub mod expiration;
pub mod pricing;
pub mod status;
pub mod transition;

#[cfg(doc)]
use common::DateTime;
use common::{unit, Date, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{user, User};

pub use self::{
    cancellation::Decision as CancellationDecision,
    classification::{classify, Bucket},
    eligibility::Ineligibility,
    expiration::{can_auto_cancel, Category},
    pricing::Pricing,
    status::Status,
    transition::{Change, Expected, Transition},
};

/// Transport (or service) order published by a producer.
#[derive(Clone, Debug)]
pub struct Freight {
    /// ID of this [`Freight`].
    pub id: Id,

    /// [`Status`] of this [`Freight`].
    pub status: Status,

    /// ID of the producer [`User`] owning this [`Freight`].
    pub producer_id: user::Id,

    /// ID of the driver [`User`] carrying this [`Freight`].
    ///
    /// Recorded for a single-truck [`Freight`] only.
    pub driver_id: Option<user::Id>,

    /// ID of the transport company [`User`] carrying this [`Freight`].
    ///
    /// Recorded for a single-truck [`Freight`] only.
    pub company_id: Option<user::Id>,

    /// [`Category`] of this [`Freight`].
    pub category: Category,

    /// [`Pricing`] of this [`Freight`].
    pub pricing: Pricing,

    /// Distance to cover, in kilometers.
    pub distance_km: Option<Decimal>,

    /// Weight of the cargo, in tons.
    pub weight_tons: Option<Decimal>,

    /// Number of trucks required by this [`Freight`].
    pub required_trucks: TruckCount,

    /// Number of trucks already assigned to this [`Freight`].
    pub accepted_trucks: TruckCount,

    /// IDs of the drivers occupying truck slots of this [`Freight`].
    ///
    /// One driver occupies one slot at most.
    pub occupant_ids: Vec<user::Id>,

    /// Regulatory floor of the per-truck price, if any applies.
    pub price_floor: Option<Money>,

    /// [`Date`] when the cargo is picked up.
    pub pickup_date: Date,

    /// [`Date`] when the cargo is expected to be delivered, if known.
    pub delivery_date: Option<Date>,

    /// [`DateTime`] when this [`Freight`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Freight`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Freight {
    /// Computes the per-truck price listed by this [`Freight`].
    ///
    /// # Errors
    ///
    /// If the [`Pricing`] scheme lacks its cargo quantity.
    pub fn unit_price(&self) -> Result<Money, pricing::Error> {
        self.pricing.unit_price(self.distance_km, self.weight_tons)
    }

    /// Indicates whether all the required trucks are assigned.
    #[must_use]
    pub fn is_fully_staffed(&self) -> bool {
        self.accepted_trucks >= self.required_trucks
    }

    /// Indicates whether the provided driver occupies a truck slot of this
    /// [`Freight`].
    #[must_use]
    pub fn is_occupied_by(&self, driver_id: user::Id) -> bool {
        self.occupant_ids.contains(&driver_id)
    }

    /// Indicates whether the provided [`User`] owns this [`Freight`].
    #[must_use]
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.producer_id == user.id
    }

    /// Indicates whether carriers may still bid on this [`Freight`].
    #[must_use]
    pub fn is_biddable(&self) -> bool {
        Status::BIDDABLE.contains(&self.status) && !self.is_fully_staffed()
    }

    /// Returns [`DateTime`] when this [`Freight`] leaves the market
    /// automatically.
    #[must_use]
    pub fn expires_at(&self) -> ExpirationDateTime {
        (self.created_at + self.category.ttl()).coerce()
    }

    /// Indicates whether this [`Freight`] must be cancelled automatically
    /// as of the provided [`DateTime`].
    ///
    /// A [`Freight`] with any truck already assigned never expires, even if
    /// it's still on the market.
    #[must_use]
    pub fn is_expired(&self, now: ExpirationDateTime) -> bool {
        can_auto_cancel(self.status)
            && self.accepted_trucks == 0
            && self.expires_at() <= now
    }

    /// Returns the list [`Bucket`] of this [`Freight`] as of the provided
    /// `today`.
    #[must_use]
    pub fn bucket(&self, today: Date) -> Bucket {
        classify(self.status, self.pickup_date, today)
    }
}

/// ID of a [`Freight`].
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

/// Number of trucks of a [`Freight`].
pub type TruckCount = u16;

/// [`DateTime`] when a [`Freight`] was created.
pub type CreationDateTime = DateTimeOf<(Freight, unit::Creation)>;

/// [`DateTime`] when a [`Freight`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Freight, unit::Modification)>;

/// [`DateTime`] when a [`Freight`] expires.
pub type ExpirationDateTime = DateTimeOf<(Freight, unit::Expiration)>;

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use common::{money::Currency, Date, Money};

    use crate::domain::user;

    use super::{
        Category, CreationDateTime, ExpirationDateTime, Freight, Id,
        ModificationDateTime, Pricing, Status,
    };

    /// Creates an [`Status::Open`] [`Freight`] requiring the provided number
    /// of trucks.
    pub(crate) fn freight(required_trucks: u16) -> Freight {
        Freight {
            id: Id::new(),
            status: Status::Open,
            producer_id: user::Id::new(),
            driver_id: None,
            company_id: None,
            category: Category::General,
            pricing: Pricing::Fixed(Money {
                amount: 1000.into(),
                currency: Currency::Brl,
            }),
            distance_km: None,
            weight_tons: None,
            required_trucks,
            accepted_trucks: 0,
            occupant_ids: vec![],
            price_floor: None,
            pickup_date: Date::today(),
            delivery_date: None,
            created_at: CreationDateTime::now(),
            updated_at: ModificationDateTime::now(),
        }
    }

    #[test]
    fn expires_only_while_biddable() {
        let mut freight = freight(1);
        freight.category = Category::Express;
        freight.created_at =
            CreationDateTime::now() - Duration::from_secs(2 * 24 * 60 * 60);
        let now = ExpirationDateTime::now();

        assert!(freight.is_expired(now));

        freight.status = Status::InNegotiation;
        assert!(freight.is_expired(now));

        freight.status = Status::Accepted;
        assert!(!freight.is_expired(now));

        freight.status = Status::Open;
        freight.category = Category::Grain;
        assert!(!freight.is_expired(now));
    }

    #[test]
    fn never_expires_once_partially_staffed() {
        let mut freight = freight(3);
        freight.category = Category::Express;
        freight.created_at =
            CreationDateTime::now() - Duration::from_secs(2 * 24 * 60 * 60);
        freight.accepted_trucks = 1;

        assert_eq!(freight.status, Status::Open);
        assert!(!freight.is_expired(ExpirationDateTime::now()));
    }

    #[test]
    fn staffing() {
        let mut freight = freight(2);
        assert!(freight.is_biddable());

        freight.accepted_trucks = 2;
        assert!(freight.is_fully_staffed());
        assert!(!freight.is_biddable());
    }
}
