//! [`Command`] for putting a cancelled [`Freight`] back on the market.

use common::operations::{By, Insert, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        freight::{self, Change, Status, Transition},
        user::{self, Role},
        Freight, StatusHistoryEntry, User,
    },
    infra::{database, outbox::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for reopening a [`Status::Cancelled`] [`Freight`] for a new
/// bidding round.
///
/// The driver, the company and the accepted trucks are cleared. Reopening
/// an already [`Status::Open`] [`Freight`] is a no-op.
#[derive(Clone, Copy, Debug)]
pub struct ReopenFreight {
    /// ID of the [`Freight`] to reopen.
    pub freight_id: freight::Id,

    /// ID of the [`User`] reopening.
    pub initiator_id: user::Id,
}

impl<Db> Command<ReopenFreight> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Freight>, freight::Id>>,
            Ok = Option<Freight>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Transition>,
            Ok = Option<Freight>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = Freight;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ReopenFreight) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReopenFreight {
            freight_id,
            initiator_id,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;

        let freight = self
            .database()
            .execute(Select(By::<Option<Freight>, _>::new(freight_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::FreightNotExists(freight_id))
            .map_err(tracerr::wrap!())?;
        if initiator.role != Role::Admin && !freight.is_owned_by(&initiator) {
            return Err(tracerr::new!(E::NotOwner(initiator.id)));
        }

        match freight.status {
            Status::Open => return Ok(freight),
            Status::Cancelled => {}
            status => return Err(tracerr::new!(E::NotCancelled(status))),
        }

        let Some(reopened) = self
            .database()
            .execute(Update(Transition::new(
                freight.id,
                [Status::Cancelled],
                Change::Reset,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        else {
            // Lost the race to another reopen.
            let current = self
                .database()
                .execute(Select(By::<Option<Freight>, _>::new(freight.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::FreightNotExists(freight.id))
                .map_err(tracerr::wrap!())?;
            return if current.status == Status::Open {
                Ok(current)
            } else {
                Err(tracerr::new!(E::NotCancelled(current.status)))
            };
        };

        self.record_status(&reopened, Some(initiator.id), None, None)
            .await;
        self.outbox.publish(Notification::FreightReopened {
            freight_id: reopened.id,
        });

        Ok(reopened)
    }
}

/// Error of [`ReopenFreight`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// [`Freight`] is neither cancelled nor open.
    #[display("`Freight` is `{_0}`, only a cancelled one may be reopened")]
    #[from(ignore)]
    NotCancelled(#[error(not(source))] Status),

    /// [`User`] doesn't own the [`Freight`].
    #[display("`User(id: {_0})` doesn't own the `Freight`")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{accept::Offer, Accept, CancelFreight},
        domain::{
            freight::{self, Status},
            user::Role,
        },
        infra::outbox::{Event, Notification},
        spec, Command as _,
    };

    use super::{ExecutionError, ReopenFreight};

    #[tokio::test]
    async fn starts_a_second_round() {
        let (svc, mut events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        spec::freight(&svc, freight.clone()).await;
        spec::consent(&svc, &freight, &driver).await;

        let accept = Accept {
            freight_id: freight.id,
            driver_id: driver.id,
            company_id: None,
            initiator_id: driver.id,
            offer: Offer::ListPrice,
        };
        _ = svc.execute(accept).await.unwrap();
        _ = svc
            .execute(CancelFreight {
                freight_id: freight.id,
                initiator_id: producer.id,
                reason: None,
            })
            .await
            .unwrap();
        while events.try_recv().is_some() {}

        let reopen = ReopenFreight {
            freight_id: freight.id,
            initiator_id: producer.id,
        };
        let reopened = svc.execute(reopen).await.unwrap();
        assert_eq!(reopened.status, Status::Open);
        assert_eq!(reopened.driver_id, None);
        assert_eq!(reopened.accepted_trucks, 0);
        assert!(matches!(
            events.try_recv(),
            Some(Event::Notification(Notification::FreightReopened { .. })),
        ));

        _ = svc.execute(reopen).await.unwrap();
        assert!(events.try_recv().is_none());

        let accepted = svc.execute(accept).await.unwrap();
        assert_eq!(accepted.status, Status::Accepted);
        assert_eq!(accepted.driver_id, Some(driver.id));
    }

    #[tokio::test]
    async fn refuses_live_freight() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        freight.status = Status::InTransit;
        spec::freight(&svc, freight.clone()).await;

        let err = svc
            .execute(ReopenFreight {
                freight_id: freight.id,
                initiator_id: producer.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotCancelled(Status::InTransit),
        ));
    }
}
