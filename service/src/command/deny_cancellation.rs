//! [`Command`] for denying a cancellation asked by a driver.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        freight::{self, Status},
        status_history,
        user::{self, Role},
        Freight, User,
    },
    infra::{database, outbox::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for denying a cancellation asked by the driver of a
/// [`Freight`] on the road.
///
/// Nothing is mutated: the driver is only notified.
#[derive(Clone, Debug)]
pub struct DenyCancellation {
    /// ID of the [`Freight`] the cancellation was asked for.
    pub freight_id: freight::Id,

    /// ID of the driver [`User`] who asked.
    pub driver_id: user::Id,

    /// ID of the producer [`User`] denying.
    pub initiator_id: user::Id,

    /// Reason of the denial, if given.
    pub reason: Option<status_history::Notes>,
}

impl<Db> Command<DenyCancellation> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Freight>, freight::Id>>,
            Ok = Option<Freight>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DenyCancellation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DenyCancellation {
            freight_id,
            driver_id,
            initiator_id,
            reason,
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
        if !Status::ON_THE_ROAD.contains(&freight.status) {
            return Err(tracerr::new!(E::NothingToDeny(freight.status)));
        }

        self.outbox.publish(Notification::CancellationDenied {
            freight_id: freight.id,
            driver_id,
            reason,
        });

        Ok(())
    }
}

/// Error of [`DenyCancellation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// [`Freight`] is not on the road, so no cancellation awaits approval.
    #[display("`Freight` is `{_0}`, no cancellation awaits approval")]
    #[from(ignore)]
    NothingToDeny(#[error(not(source))] Status),

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
        domain::{
            freight::{self, Status},
            status_history::Notes,
            user::Role,
        },
        infra::outbox::{Event, Notification},
        spec, Command as _,
    };

    use super::{DenyCancellation, ExecutionError};

    #[tokio::test]
    async fn notifies_the_driver() {
        let (svc, mut events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        freight.status = Status::Loaded;
        freight.driver_id = Some(driver.id);
        spec::freight(&svc, freight.clone()).await;

        svc.execute(DenyCancellation {
            freight_id: freight.id,
            driver_id: driver.id,
            initiator_id: producer.id,
            reason: Notes::new("Carga já embarcada"),
        })
        .await
        .unwrap();
        assert!(matches!(
            events.try_recv(),
            Some(Event::Notification(Notification::CancellationDenied {
                driver_id, ..
            })) if driver_id == driver.id,
        ));
        assert_eq!(spec::stored(&svc, freight.id).await.status, Status::Loaded);

        let stranger = spec::user(&svc, Role::Producer, None).await;
        let err = svc
            .execute(DenyCancellation {
                freight_id: freight.id,
                driver_id: driver.id,
                initiator_id: stranger.id,
                reason: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
    }

    #[tokio::test]
    async fn refuses_before_the_road() {
        let (svc, mut events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        spec::freight(&svc, freight.clone()).await;

        let err = svc
            .execute(DenyCancellation {
                freight_id: freight.id,
                driver_id: driver.id,
                initiator_id: producer.id,
                reason: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NothingToDeny(Status::Open),
        ));
        assert!(events.try_recv().is_none());
    }
}
