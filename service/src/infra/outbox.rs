//! [`Outbox`] of events fired by the [`Service`] without awaiting their
//! delivery.

use common::Money;
use derive_more::{Display, From};
use tokio::sync::mpsc;
use tracing as log;

#[cfg(doc)]
use crate::{
    domain::{Freight, Proposal},
    Service,
};
use crate::domain::{
    freight::{self, Status},
    proposal, status_history, user,
};

/// Sending side of the events queue.
///
/// Publishing never blocks, never fails and never waits for the delivery.
#[derive(Clone, Debug)]
pub struct Outbox(mpsc::UnboundedSender<Event>);

impl Outbox {
    /// Creates a new [`Outbox`] along with its [`Receiver`].
    #[must_use]
    pub fn new() -> (Self, Receiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), Receiver(rx))
    }

    /// Publishes the provided [`Event`].
    pub fn publish(&self, event: impl Into<Event>) {
        if let Err(mpsc::error::SendError(event)) = self.0.send(event.into()) {
            log::warn!("`Outbox` is closed, `{event}` is dropped");
        }
    }
}

/// Receiving side of the events queue.
#[derive(Debug)]
pub struct Receiver(mpsc::UnboundedReceiver<Event>);

impl Receiver {
    /// Receives the next [`Event`].
    ///
    /// [`None`] is returned once every [`Outbox`] is dropped and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.0.recv().await
    }

    /// Receives the next [`Event`] if there is one already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.0.try_recv().ok()
    }
}

/// Event published into an [`Outbox`].
#[derive(Clone, Debug, Display, From)]
pub enum Event {
    /// [`Notification`] for the platform users.
    Notification(Notification),

    /// [`Incident`] requiring a reconciliation.
    Incident(Incident),
}

/// Typed notification for the platform users, delivered by an external
/// dispatcher.
#[derive(Clone, Debug, Display)]
pub enum Notification {
    /// Truck slot of a [`Freight`] is occupied.
    #[display("FreightAccepted(freight: {freight_id}, driver: {driver_id})")]
    FreightAccepted {
        /// ID of the accepted [`Freight`].
        freight_id: freight::Id,

        /// ID of the producer owning the [`Freight`].
        producer_id: user::Id,

        /// ID of the assigned driver.
        driver_id: user::Id,

        /// ID of the company the driver works for, if any.
        company_id: Option<user::Id>,

        /// Indicator whether all the required trucks are assigned now.
        fully_staffed: bool,
    },

    /// Producer received a price [`Proposal`].
    #[display(
        "ProposalReceived(freight: {freight_id}, proposal: {proposal_id})"
    )]
    ProposalReceived {
        /// ID of the negotiated [`Freight`].
        freight_id: freight::Id,

        /// ID of the producer to notify.
        producer_id: user::Id,

        /// ID of the received [`Proposal`].
        proposal_id: proposal::Id,

        /// Proposed per-truck price.
        price: Money,
    },

    /// Driver's [`Proposal`] is rejected.
    #[display(
        "ProposalRejected(freight: {freight_id}, proposal: {proposal_id})"
    )]
    ProposalRejected {
        /// ID of the negotiated [`Freight`].
        freight_id: freight::Id,

        /// ID of the rejected [`Proposal`].
        proposal_id: proposal::Id,

        /// ID of the driver to notify.
        driver_id: user::Id,
    },

    /// [`Freight`] changed its [`Status`].
    #[display("StatusChanged(freight: {freight_id}, {from} -> {to})")]
    StatusChanged {
        /// ID of the [`Freight`].
        freight_id: freight::Id,

        /// Previous [`Status`].
        from: Status,

        /// New [`Status`].
        to: Status,

        /// ID of the user who changed the [`Status`], if any.
        changed_by: Option<user::Id>,
    },

    /// Driver asks the producer to approve a cancellation.
    #[display(
        "CancellationRequested(freight: {freight_id}, driver: {driver_id})"
    )]
    CancellationRequested {
        /// ID of the [`Freight`] to cancel.
        freight_id: freight::Id,

        /// ID of the producer who must decide.
        producer_id: user::Id,

        /// ID of the driver asking.
        driver_id: user::Id,

        /// Reason of the cancellation, if given.
        reason: Option<status_history::Notes>,
    },

    /// Producer denied a cancellation asked by a driver.
    #[display("CancellationDenied(freight: {freight_id}, driver: {driver_id})")]
    CancellationDenied {
        /// ID of the [`Freight`].
        freight_id: freight::Id,

        /// ID of the driver to notify.
        driver_id: user::Id,

        /// Reason of the denial, if given.
        reason: Option<status_history::Notes>,
    },

    /// [`Freight`] is cancelled.
    #[display("FreightCancelled(freight: {freight_id})")]
    FreightCancelled {
        /// ID of the cancelled [`Freight`].
        freight_id: freight::Id,

        /// ID of the user who cancelled the [`Freight`].
        cancelled_by: user::Id,

        /// IDs of the drivers whose assignments are cancelled.
        drivers: Vec<user::Id>,
    },

    /// [`Freight`] left the market automatically.
    #[display("FreightExpired(freight: {freight_id})")]
    FreightExpired {
        /// ID of the expired [`Freight`].
        freight_id: freight::Id,

        /// ID of the producer to notify.
        producer_id: user::Id,
    },

    /// Cancelled [`Freight`] is back on the market.
    #[display("FreightReopened(freight: {freight_id})")]
    FreightReopened {
        /// ID of the reopened [`Freight`].
        freight_id: freight::Id,
    },

    /// [`Freight`] is delivered and may be settled by the payments and
    /// fiscal integrations.
    #[display("FreightSettleable(freight: {freight_id})")]
    FreightSettleable {
        /// ID of the delivered [`Freight`].
        freight_id: freight::Id,

        /// ID of the producer paying.
        producer_id: user::Id,

        /// Total amount due, if anything is agreed.
        payable: Option<Money>,
    },
}

/// Failed best-effort side write, to be retried or reconciled
/// asynchronously.
///
/// The primary [`Freight`] transition is already committed when this
/// happens.
#[derive(Clone, Debug, Display)]
#[display("Incident(freight: {freight_id}, operation: {operation}): {error}")]
pub struct Incident {
    /// ID of the [`Freight`] the side write relates to.
    pub freight_id: freight::Id,

    /// Name of the failed operation.
    pub operation: &'static str,

    /// Error the operation failed with.
    pub error: String,
}

#[cfg(test)]
mod spec {
    use crate::domain::freight;

    use super::{Event, Incident, Notification, Outbox};

    #[test]
    fn queues_without_waiting() {
        let (outbox, mut rx) = Outbox::new();
        let freight_id = freight::Id::new();

        outbox.publish(Notification::FreightReopened { freight_id });
        outbox.publish(Incident {
            freight_id,
            operation: "insert `Assignment`",
            error: "connection reset".into(),
        });

        assert!(matches!(
            rx.try_recv(),
            Some(Event::Notification(Notification::FreightReopened { .. })),
        ));
        assert!(matches!(rx.try_recv(), Some(Event::Incident(_))));
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn publishing_into_closed_outbox_is_harmless() {
        let (outbox, rx) = Outbox::new();
        drop(rx);

        outbox.publish(Notification::FreightReopened {
            freight_id: freight::Id::new(),
        });
    }
}
