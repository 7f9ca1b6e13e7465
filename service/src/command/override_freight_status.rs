//! [`Command`] for overriding a [`Freight`] status administratively.

use common::operations::{By, Insert, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        freight::{self, Change, Status, Transition},
        status_history,
        user::{self, Role},
        Assignment, Freight, Proposal, StatusHistoryEntry, User,
    },
    infra::{database, outbox::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for setting any [`Status`] of a [`Freight`] by an
/// administrator, bypassing the lifecycle transitions.
///
/// This is the only way out of a terminal [`Status`].
#[derive(Clone, Debug)]
pub struct OverrideFreightStatus {
    /// ID of the [`Freight`] to override the [`Status`] of.
    pub freight_id: freight::Id,

    /// ID of the administrator [`User`].
    pub initiator_id: user::Id,

    /// [`Status`] to set.
    pub new_status: Status,

    /// Notes to record along, if any.
    pub notes: Option<status_history::Notes>,
}

impl<Db> Command<OverrideFreightStatus> for Service<Db>
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
            Select<By<Vec<Assignment>, freight::Id>>,
            Ok = Vec<Assignment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Proposal>, freight::Id>>,
            Ok = Vec<Proposal>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Transition>,
            Ok = Option<Freight>,
            Err = Traced<database::Error>,
        > + Database<Update<Assignment>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Proposal>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = Freight;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: OverrideFreightStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let OverrideFreightStatus {
            freight_id,
            initiator_id,
            new_status,
            notes,
        } = cmd;

        let admin = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        if admin.role != Role::Admin {
            return Err(tracerr::new!(E::NotAdmin(admin.id)));
        }

        let freight = self
            .database()
            .execute(Select(By::<Option<Freight>, _>::new(freight_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::FreightNotExists(freight_id))
            .map_err(tracerr::wrap!())?;
        let from = freight.status;
        if from == new_status {
            return Ok(freight);
        }

        let freight = self
            .database()
            .execute(Update(Transition::new(
                freight.id,
                [from],
                Change::Status(new_status),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::Conflict(freight.id))
            .map_err(tracerr::wrap!())?;
        log::info!(
            freight_id = %freight.id,
            admin_id = %admin.id,
            "`Freight` status overridden: {from} -> {new_status}",
        );

        self.outbox.publish(Notification::StatusChanged {
            freight_id: freight.id,
            from,
            to: freight.status,
            changed_by: Some(admin.id),
        });
        match freight.status {
            Status::Cancelled => {
                let drivers =
                    self.release(&freight, Some(admin.id), notes).await;
                self.outbox.publish(Notification::FreightCancelled {
                    freight_id: freight.id,
                    cancelled_by: admin.id,
                    drivers,
                });
            }
            Status::Delivered | Status::Completed => {
                self.record_status(&freight, Some(admin.id), notes, None)
                    .await;
                self.settle(&freight).await;
            }
            Status::Open
            | Status::InNegotiation
            | Status::Accepted
            | Status::Loading
            | Status::Loaded
            | Status::InTransit
            | Status::DeliveredPendingConfirmation
            | Status::Rejected => {
                self.record_status(&freight, Some(admin.id), notes, None)
                    .await;
            }
        }

        Ok(freight)
    }
}

/// Error of [`OverrideFreightStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Freight`] changed its [`Status`] concurrently.
    #[display("`Freight(id: {_0})` changed concurrently")]
    #[from(ignore)]
    Conflict(#[error(not(source))] freight::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// [`User`] is not an administrator.
    #[display("`User(id: {_0})` is not an administrator")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

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
            user::Role,
        },
        infra::outbox::{Event, Notification},
        spec, Command as _,
    };

    use super::{ExecutionError, OverrideFreightStatus};

    #[tokio::test]
    async fn leaves_terminal_status() {
        let (svc, mut events) = spec::service();
        let admin = spec::user(&svc, Role::Admin, None).await;
        let mut freight = freight::spec::freight(1);
        freight.status = Status::Delivered;
        spec::freight(&svc, freight.clone()).await;

        let completed = svc
            .execute(OverrideFreightStatus {
                freight_id: freight.id,
                initiator_id: admin.id,
                new_status: Status::Completed,
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(completed.status, Status::Completed);

        let events =
            std::iter::from_fn(|| events.try_recv()).collect::<Vec<_>>();
        assert!(matches!(
            events[0],
            Event::Notification(Notification::StatusChanged {
                from: Status::Delivered,
                to: Status::Completed,
                ..
            }),
        ));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Notification(Notification::FreightSettleable { .. }),
        )));
    }

    #[tokio::test]
    async fn only_admin_overrides() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        spec::freight(&svc, freight.clone()).await;

        let err = svc
            .execute(OverrideFreightStatus {
                freight_id: freight.id,
                initiator_id: producer.id,
                new_status: Status::Completed,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));
        assert_eq!(
            spec::stored(&svc, freight.id).await.status,
            Status::Open,
        );
    }
}
