//! [`Command`] for creating a new [`Freight`].

use common::{
    operations::{By, Insert, Select},
    Date, Money,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{
        freight::{self, pricing, Category, Pricing, Status},
        user::{self, Role},
        Freight, StatusHistoryEntry, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for publishing a new [`Freight`] on the market.
#[derive(Clone, Debug)]
pub struct CreateFreight {
    /// [`Category`] of the new [`Freight`].
    pub category: Category,

    /// [`Pricing`] of the new [`Freight`].
    pub pricing: Pricing,

    /// Distance to cover, in kilometers.
    pub distance_km: Option<Decimal>,

    /// Weight of the cargo, in tons.
    pub weight_tons: Option<Decimal>,

    /// Number of trucks required.
    pub required_trucks: freight::TruckCount,

    /// Regulatory floor of the per-truck price, if any applies.
    pub price_floor: Option<Money>,

    /// [`Date`] when the cargo is picked up.
    pub pickup_date: Date,

    /// [`Date`] when the cargo is expected to be delivered, if known.
    pub delivery_date: Option<Date>,

    /// ID of the [`User`] publishing the [`Freight`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CreateFreight> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Freight>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = Freight;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateFreight) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateFreight {
            category,
            pricing,
            distance_km,
            weight_tons,
            required_trucks,
            price_floor,
            pickup_date,
            delivery_date,
            initiator_id,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        if !initiator.is_shipper() {
            return Err(tracerr::new!(E::Forbidden(initiator.role)));
        }

        if required_trucks == 0 {
            return Err(tracerr::new!(E::NoTrucksRequired));
        }
        if delivery_date.is_some_and(|d| d < pickup_date) {
            return Err(tracerr::new!(E::DeliveryBeforePickup));
        }

        let now = freight::CreationDateTime::now();
        let freight = Freight {
            id: freight::Id::new(),
            status: Status::Open,
            producer_id: initiator.id,
            driver_id: None,
            company_id: None,
            category,
            pricing,
            distance_km,
            weight_tons,
            required_trucks,
            accepted_trucks: 0,
            occupant_ids: vec![],
            price_floor,
            pickup_date,
            delivery_date,
            created_at: now,
            updated_at: now.coerce(),
        };
        let unit_price =
            freight.unit_price().map_err(tracerr::from_and_wrap!(=> E))?;
        pricing::check_price(unit_price, price_floor)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        self.database()
            .execute(Insert(freight.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.record_status(&freight, Some(initiator.id), None, None)
            .await;

        Ok(freight)
    }
}

/// Error of [`CreateFreight`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Delivery [`Date`] precedes the pickup one.
    #[display("Delivery date precedes the pickup date")]
    DeliveryBeforePickup,

    /// [`User`] may not publish freights.
    #[display("`{_0}` may not publish freights")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] Role),

    /// Listed price is invalid.
    #[display("Invalid price: {_0}")]
    InvalidPrice(pricing::Error),

    /// Zero trucks are required.
    #[display("At least one truck must be required")]
    NoTrucksRequired,

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Select},
        Date, Money,
    };
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            freight::{pricing, Category, Pricing, Status},
            user::Role,
            StatusHistoryEntry, User,
        },
        infra::Database as _,
        spec, Command as _,
    };

    use super::{CreateFreight, ExecutionError};

    fn brl(amount: u32) -> Money {
        Money {
            amount: amount.into(),
            currency: Currency::Brl,
        }
    }

    fn create(initiator: &User) -> CreateFreight {
        CreateFreight {
            category: Category::Grain,
            pricing: Pricing::PerTon(brl(80)),
            distance_km: Some(Decimal::from(420)),
            weight_tons: Some(Decimal::from(30)),
            required_trucks: 2,
            price_floor: Some(brl(2000)),
            pickup_date: Date::from_ymd(2030, 3, 10).unwrap(),
            delivery_date: Date::from_ymd(2030, 3, 12),
            initiator_id: initiator.id,
        }
    }

    #[tokio::test]
    async fn publishes_open_freight_with_history() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;

        let freight = svc.execute(create(&producer)).await.unwrap();
        assert_eq!(freight.status, Status::Open);
        assert_eq!(freight.producer_id, producer.id);
        assert_eq!(freight.accepted_trucks, 0);
        assert_eq!(freight.unit_price(), Ok(brl(2400)));

        let history: Vec<StatusHistoryEntry> = svc
            .database()
            .execute(Select(By::<Vec<StatusHistoryEntry>, _>::new(freight.id)))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, Status::Open);
        assert_eq!(history[0].changed_by, Some(producer.id));
    }

    #[tokio::test]
    async fn validates_input() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let driver = spec::user(&svc, Role::Driver, None).await;

        let err = svc.execute(create(&driver)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Forbidden(Role::Driver),
        ));

        let mut cmd = create(&producer);
        cmd.required_trucks = 0;
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoTrucksRequired));

        let mut cmd = create(&producer);
        cmd.delivery_date = Date::from_ymd(2030, 3, 9);
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DeliveryBeforePickup));

        let mut cmd = create(&producer);
        cmd.weight_tons = None;
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPrice(pricing::Error::MissingWeight),
        ));

        let mut cmd = create(&producer);
        cmd.weight_tons = Some(Decimal::from(20));
        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPrice(pricing::Error::BelowFloor { .. }),
        ));
    }
}
