//! [`DispatchOutbox`] [`Task`].

use std::{convert::Infallible, marker::PhantomData};

use common::operations::{By, Notify, Start};
use tracing as log;

use crate::{
    infra::outbox::{self, Event, Incident, Notification},
    Service,
};

use super::Task;

/// [`Task`] for draining the [`Outbox`] of a [`Service`] and handing its
/// [`Event`]s over to the delivery.
///
/// Delivery itself happens outside of this application, so [`Event`]s are
/// emitted as structured logs at this boundary.
///
/// [`Outbox`]: crate::infra::Outbox
#[derive(Clone, Copy, Debug)]
pub struct DispatchOutbox<S>(PhantomData<S>);

impl<Db> Task<Start<By<DispatchOutbox<Self>, outbox::Receiver>>>
    for Service<Db>
where
    Self: Task<Notify<Event>, Ok = (), Err = Infallible>,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<DispatchOutbox<Self>, outbox::Receiver>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut events = by.into_inner();
        while let Some(event) = events.recv().await {
            self.execute(Notify(event)).await?;
        }
        log::debug!("`task::DispatchOutbox` stopped: `Outbox` is closed");
        Ok(())
    }
}

impl<Db> Task<Notify<Event>> for Service<Db> {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Notify(event): Notify<Event>,
    ) -> Result<Self::Ok, Self::Err> {
        match event {
            Event::Notification(n) => {
                log::info!(
                    target: "outbox",
                    kind = kind(&n),
                    freight_id = %subject(&n),
                    "{n}",
                );
            }
            Event::Incident(Incident {
                freight_id,
                operation,
                error,
            }) => {
                log::warn!(
                    target: "outbox",
                    kind = "Incident",
                    %freight_id,
                    operation,
                    "side write needs reconciliation: {error}",
                );
            }
        }
        Ok(())
    }
}

/// Returns the name of the provided [`Notification`] kind.
const fn kind(n: &Notification) -> &'static str {
    match n {
        Notification::FreightAccepted { .. } => "FreightAccepted",
        Notification::ProposalReceived { .. } => "ProposalReceived",
        Notification::ProposalRejected { .. } => "ProposalRejected",
        Notification::StatusChanged { .. } => "StatusChanged",
        Notification::CancellationRequested { .. } => "CancellationRequested",
        Notification::CancellationDenied { .. } => "CancellationDenied",
        Notification::FreightCancelled { .. } => "FreightCancelled",
        Notification::FreightExpired { .. } => "FreightExpired",
        Notification::FreightReopened { .. } => "FreightReopened",
        Notification::FreightSettleable { .. } => "FreightSettleable",
    }
}

/// Returns ID of the [`Freight`] the provided [`Notification`] is about.
///
/// [`Freight`]: crate::domain::Freight
fn subject(n: &Notification) -> crate::domain::freight::Id {
    match n {
        Notification::FreightAccepted { freight_id, .. }
        | Notification::ProposalReceived { freight_id, .. }
        | Notification::ProposalRejected { freight_id, .. }
        | Notification::StatusChanged { freight_id, .. }
        | Notification::CancellationRequested { freight_id, .. }
        | Notification::CancellationDenied { freight_id, .. }
        | Notification::FreightCancelled { freight_id, .. }
        | Notification::FreightExpired { freight_id, .. }
        | Notification::FreightReopened { freight_id }
        | Notification::FreightSettleable { freight_id, .. } => *freight_id,
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Start};

    use crate::{
        domain::freight,
        infra::outbox::{Incident, Notification},
        spec, Task as _,
    };

    #[tokio::test]
    async fn drains_until_closed() {
        let (svc, events) = spec::service();
        let freight_id = freight::Id::new();
        svc.outbox()
            .publish(Notification::FreightReopened { freight_id });
        svc.outbox().publish(Incident {
            freight_id,
            operation: "insert `Assignment`",
            error: "connection reset".into(),
        });
        drop(svc);

        let (dispatcher, _) = spec::service();
        dispatcher.execute(Start(By::new(events))).await.unwrap();
    }
}
