//! [`Command`] for advancing a [`Freight`] along its lifecycle.

use common::operations::{By, Insert, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        assignment,
        freight::{self, Change, Status, Transition},
        status_history,
        user::{self, Role},
        Assignment, Freight, StatusHistoryEntry, User,
    },
    infra::{database, outbox::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for advancing a [`Freight`] to the next [`Status`] of its
/// lifecycle.
///
/// The transition is re-validated against the stored [`Freight`] and
/// written expecting exactly the [`Status`] it was validated against.
#[derive(Clone, Debug)]
pub struct AdvanceFreightStatus {
    /// ID of the [`Freight`] to advance.
    pub freight_id: freight::Id,

    /// ID of the [`User`] advancing.
    pub initiator_id: user::Id,

    /// [`Status`] to advance to.
    pub new_status: Status,

    /// Notes to record along, if any.
    pub notes: Option<status_history::Notes>,

    /// Location to record along, if any.
    pub location: Option<status_history::Location>,
}

impl<Db> Command<AdvanceFreightStatus> for Service<Db>
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
            Update<Transition>,
            Ok = Option<Freight>,
            Err = Traced<database::Error>,
        > + Database<Update<Assignment>, Ok = (), Err = Traced<database::Error>>
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
        cmd: AdvanceFreightStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AdvanceFreightStatus {
            freight_id,
            initiator_id,
            new_status,
            notes,
            location,
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
        let from = freight.status;

        if from.is_final() {
            return Err(tracerr::new!(E::FinalStateLocked(from)));
        }
        if new_status == Status::Cancelled
            || !from.can_transition_to(new_status)
        {
            return Err(tracerr::new!(E::InvalidTransition {
                from,
                to: new_status,
                allowed: from.next(),
            }));
        }
        // Only accepting, proposing or rejecting reach these.
        if new_status == Status::Accepted
            || Status::BIDDABLE.contains(&new_status)
        {
            return Err(tracerr::new!(E::MarketOnly(new_status)));
        }

        match initiator.role {
            Role::Driver => {
                let assigned = freight.driver_id == Some(initiator.id)
                    || self
                        .database()
                        .execute(Select(By::<Vec<Assignment>, _>::new(
                            freight.id,
                        )))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?
                        .iter()
                        .any(|a| {
                            a.driver_id == initiator.id
                                && a.status == assignment::Status::Accepted
                        });
                if !assigned {
                    return Err(tracerr::new!(E::NotOwner(initiator.id)));
                }
                if !Status::ON_THE_ROAD.contains(&new_status) {
                    return Err(tracerr::new!(E::Forbidden(initiator.role)));
                }
            }
            Role::Producer => {
                if !freight.is_owned_by(&initiator) {
                    return Err(tracerr::new!(E::NotOwner(initiator.id)));
                }
                if new_status != Status::Delivered {
                    return Err(tracerr::new!(E::Forbidden(initiator.role)));
                }
            }
            Role::Admin => {}
            Role::Company => {
                return Err(tracerr::new!(E::Forbidden(initiator.role)));
            }
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

        self.record_status(&freight, Some(initiator.id), notes, location)
            .await;
        self.outbox.publish(Notification::StatusChanged {
            freight_id: freight.id,
            from,
            to: freight.status,
            changed_by: Some(initiator.id),
        });
        if matches!(freight.status, Status::Delivered | Status::Completed) {
            self.settle(&freight).await;
        }

        Ok(freight)
    }
}

/// Error of [`AdvanceFreightStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Freight`] changed its [`Status`] concurrently.
    #[display("`Freight(id: {_0})` changed concurrently")]
    #[from(ignore)]
    Conflict(#[error(not(source))] freight::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Freight`] is in a terminal [`Status`].
    #[display("`Freight` is `{_0}` and cannot change anymore")]
    #[from(ignore)]
    FinalStateLocked(#[error(not(source))] Status),

    /// [`User`] may not make this transition.
    #[display("`{_0}` may not make this transition")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] Role),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// Transition is not in the lifecycle.
    #[display("`{from}` -> `{to}` is not allowed")]
    #[from(ignore)]
    InvalidTransition {
        /// Current [`Status`].
        from: Status,

        /// Requested [`Status`].
        to: Status,

        /// [`Status`]es allowed from the current one.
        allowed: &'static [Status],
    },

    /// [`Status`] is reached through the market only.
    #[display("`{_0}` is reached through the market only")]
    #[from(ignore)]
    MarketOnly(#[error(not(source))] Status),

    /// [`User`] is neither the owner nor the assigned driver.
    #[display("`User(id: {_0})` is not bound to the `Freight`")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{accept::Offer, Accept},
        domain::{
            assignment,
            freight::{self, Status},
            status_history::{Location, Notes},
            user::Role,
            Assignment, Freight, StatusHistoryEntry, User,
        },
        infra::{
            outbox::{Event, Notification},
            Database as _, Memory,
        },
        spec, Command as _, Service,
    };

    use super::{AdvanceFreightStatus, ExecutionError};

    /// Stores a single-truck [`Freight`] owned by a new producer and
    /// accepted by a new driver.
    async fn accepted(svc: &Service<Memory>) -> (Freight, User, User) {
        let producer = spec::user(svc, Role::Producer, None).await;
        let driver = spec::user(svc, Role::Driver, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        spec::freight(svc, freight.clone()).await;
        spec::consent(svc, &freight, &driver).await;
        let freight = svc
            .execute(Accept {
                freight_id: freight.id,
                driver_id: driver.id,
                company_id: None,
                initiator_id: driver.id,
                offer: Offer::ListPrice,
            })
            .await
            .unwrap();
        (freight, producer, driver)
    }

    fn advance(
        freight: &Freight,
        initiator: &User,
        to: Status,
    ) -> AdvanceFreightStatus {
        AdvanceFreightStatus {
            freight_id: freight.id,
            initiator_id: initiator.id,
            new_status: to,
            notes: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn drives_through_the_lifecycle() {
        let (svc, mut events) = spec::service();
        let (freight, producer, driver) = accepted(&svc).await;
        while events.try_recv().is_some() {}

        for to in Status::ON_THE_ROAD {
            let mut cmd = advance(&freight, &driver, to);
            cmd.location = Location::new(-23.55, -46.63);
            cmd.notes = Notes::new("ok");
            let advanced = svc.execute(cmd).await.unwrap();
            assert_eq!(advanced.status, to);
            assert!(matches!(
                events.try_recv(),
                Some(Event::Notification(Notification::StatusChanged {
                    to: t, ..
                })) if t == to,
            ));
        }

        let err = svc
            .execute(advance(&freight, &driver, Status::Delivered))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Forbidden(Role::Driver),
        ));

        let delivered = svc
            .execute(advance(&freight, &producer, Status::Delivered))
            .await
            .unwrap();
        assert_eq!(delivered.status, Status::Delivered);

        let history: Vec<StatusHistoryEntry> = svc
            .database()
            .execute(Select(By::<Vec<StatusHistoryEntry>, _>::new(
                freight.id,
            )))
            .await
            .unwrap();
        assert!(history
            .iter()
            .filter(|e| Status::ON_THE_ROAD.contains(&e.status))
            .all(|e| e.location.is_some() && e.changed_by == Some(driver.id)));

        let assignments: Vec<Assignment> = svc
            .database()
            .execute(Select(By::<Vec<Assignment>, _>::new(freight.id)))
            .await
            .unwrap();
        assert!(assignments
            .iter()
            .all(|a| a.status == assignment::Status::Completed));
        assert!(std::iter::from_fn(|| events.try_recv()).any(|e| matches!(
            e,
            Event::Notification(Notification::FreightSettleable { .. }),
        )));

        let err = svc
            .execute(advance(&freight, &producer, Status::Completed))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::FinalStateLocked(Status::Delivered),
        ));
    }

    #[tokio::test]
    async fn refuses_skips_and_strangers() {
        let (svc, _events) = spec::service();
        let (freight, producer, _driver) = accepted(&svc).await;
        let stranger = spec::user(&svc, Role::Driver, None).await;
        let admin = spec::user(&svc, Role::Admin, None).await;

        let err = svc
            .execute(advance(&freight, &stranger, Status::Loading))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        let err = svc
            .execute(advance(&freight, &admin, Status::InTransit))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition {
                from: Status::Accepted,
                to: Status::InTransit,
                ..
            },
        ));

        let err = svc
            .execute(advance(&freight, &producer, Status::Cancelled))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition { .. },
        ));

        let rejected = svc
            .execute(advance(&freight, &admin, Status::Rejected))
            .await
            .unwrap();
        assert_eq!(rejected.status, Status::Rejected);
    }

    #[tokio::test]
    async fn leaves_market_statuses_to_the_market() {
        let (svc, _events) = spec::service();
        let admin = spec::user(&svc, Role::Admin, None).await;
        let freight = freight::spec::freight(2);
        spec::freight(&svc, freight.clone()).await;

        for to in [Status::Accepted, Status::InNegotiation] {
            let err = svc
                .execute(advance(&freight, &admin, to))
                .await
                .unwrap_err();
            assert!(
                matches!(
                    err.as_ref(),
                    ExecutionError::MarketOnly(s) if *s == to,
                ),
                "{to}",
            );
        }

        let stored = spec::stored(&svc, freight.id).await;
        assert_eq!(stored.status, Status::Open);
        assert_eq!(stored.accepted_trucks, 0);
        assert_eq!(stored.driver_id, None);
    }
}
