//! [`Command`] for cancelling a [`Freight`].

use common::operations::{By, Insert, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        assignment,
        freight::{
            self, cancellation, CancellationDecision as Decision, Change,
            Status, Transition,
        },
        status_history,
        user::{self, Role},
        Assignment, Freight, Proposal, StatusHistoryEntry, User,
    },
    infra::{database, outbox::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a [`Freight`] by its owner, its assigned
/// driver or an administrator.
///
/// What happens is decided by the cancellation policy for the initiator
/// role and the current [`Status`]. Cancelling an already cancelled
/// [`Freight`] succeeds with [`Outcome::AlreadyCancelled`].
#[derive(Clone, Debug)]
pub struct CancelFreight {
    /// ID of the [`Freight`] to cancel.
    pub freight_id: freight::Id,

    /// ID of the [`User`] cancelling.
    pub initiator_id: user::Id,

    /// Reason of the cancellation, if given.
    pub reason: Option<status_history::Notes>,
}

/// Successful [`Outcome`] of a [`CancelFreight`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Outcome {
    /// [`Freight`] is cancelled.
    Cancelled,

    /// [`Freight`] was cancelled already.
    AlreadyCancelled,

    /// Producer is asked to approve the cancellation, nothing changed yet.
    ApprovalRequested,

    /// Cancellation must go through the support.
    ContactSupport,
}

impl<Db> Command<CancelFreight> for Service<Db>
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
    type Ok = Outcome;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelFreight) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelFreight {
            freight_id,
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

        match initiator.role {
            Role::Producer if !freight.is_owned_by(&initiator) => {
                return Err(tracerr::new!(E::NotOwner(initiator.id)));
            }
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
            }
            Role::Producer | Role::Company | Role::Admin => {}
        }

        if freight.status == Status::Cancelled {
            return Ok(Outcome::AlreadyCancelled);
        }

        match cancellation::decide(initiator.role, freight.status) {
            Decision::None if freight.status.is_final() => {
                Err(tracerr::new!(E::FinalStateLocked(freight.status)))
            }
            Decision::None => {
                Err(tracerr::new!(E::Forbidden(initiator.role)))
            }
            Decision::ContactSupport => Ok(Outcome::ContactSupport),
            Decision::RequestApproval => {
                self.outbox.publish(Notification::CancellationRequested {
                    freight_id: freight.id,
                    producer_id: freight.producer_id,
                    driver_id: initiator.id,
                    reason,
                });
                Ok(Outcome::ApprovalRequested)
            }
            Decision::DirectCancel => {
                let cancelled = self
                    .database()
                    .execute(Update(Transition::new(
                        freight.id,
                        [freight.status],
                        Change::Status(Status::Cancelled),
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                let Some(cancelled) = cancelled else {
                    let current = self
                        .database()
                        .execute(Select(By::<Option<Freight>, _>::new(
                            freight.id,
                        )))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?
                        .ok_or(E::FreightNotExists(freight.id))
                        .map_err(tracerr::wrap!())?;
                    return if current.status == Status::Cancelled {
                        Ok(Outcome::AlreadyCancelled)
                    } else {
                        Err(tracerr::new!(E::Conflict(freight.id)))
                    };
                };

                let drivers =
                    self.release(&cancelled, Some(initiator.id), reason).await;
                self.outbox.publish(Notification::FreightCancelled {
                    freight_id: cancelled.id,
                    cancelled_by: initiator.id,
                    drivers,
                });
                Ok(Outcome::Cancelled)
            }
        }
    }
}

/// Error of [`CancelFreight`] [`Command`] execution.
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
    #[display("`Freight` is `{_0}` and cannot be cancelled")]
    #[from(ignore)]
    FinalStateLocked(#[error(not(source))] Status),

    /// [`User`] may not cancel the [`Freight`] in its current [`Status`].
    #[display("`{_0}` may not cancel the `Freight` now")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] Role),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// [`User`] is neither the owner nor the assigned driver.
    #[display("`User(id: {_0})` is not bound to the `Freight`")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}
