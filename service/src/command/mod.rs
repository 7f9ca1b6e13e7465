//! [`Command`] definition.

pub mod accept;
pub mod accept_proposal;
pub mod advance_freight_status;
pub mod authorize_user;
pub mod cancel_freight;
pub mod create_freight;
pub mod deny_cancellation;
pub mod grant_tracking_consent;
pub mod override_freight_status;
pub mod propose_price;
pub mod reject_proposal;
pub mod reopen_freight;

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        assignment, freight, proposal, status_history, user, Assignment,
        Freight, Proposal, StatusHistoryEntry,
    },
    infra::{
        database,
        outbox::{Incident, Notification},
        Database,
    },
    Service,
};

/// [`Command`] of the [`Service`].
pub use common::Handler as Command;

pub use self::{
    accept::Accept, accept_proposal::AcceptProposal,
    advance_freight_status::AdvanceFreightStatus,
    authorize_user::AuthorizeUser, cancel_freight::CancelFreight,
    create_freight::CreateFreight, deny_cancellation::DenyCancellation,
    grant_tracking_consent::GrantTrackingConsent,
    override_freight_status::OverrideFreightStatus,
    propose_price::ProposePrice, reject_proposal::RejectProposal,
    reopen_freight::ReopenFreight,
};

impl<Db> Service<Db> {
    /// Executes the provided [`Database`] operation following an already
    /// committed [`Freight`] transition.
    ///
    /// Failure never undoes the transition: it's logged and reported as an
    /// [`Incident`] for an asynchronous reconciliation, and [`None`] is
    /// returned.
    async fn best_effort<Op, T>(
        &self,
        freight_id: freight::Id,
        operation: &'static str,
        op: Op,
    ) -> Option<T>
    where
        Db: Database<Op, Ok = T, Err = Traced<database::Error>>,
    {
        match self.database().execute(op).await {
            Ok(ok) => Some(ok),
            Err(e) => {
                log::error!(
                    "`{operation}` failed after `Freight(id: {freight_id})` \
                     transition: {e}",
                );
                self.outbox.publish(Incident {
                    freight_id,
                    operation,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Appends a [`StatusHistoryEntry`] of the provided [`Freight`] current
    /// [`freight::Status`].
    async fn record_status(
        &self,
        freight: &Freight,
        changed_by: Option<user::Id>,
        notes: Option<status_history::Notes>,
        location: Option<status_history::Location>,
    ) where
        Db: Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
    {
        let mut entry = StatusHistoryEntry::new(
            freight.id,
            freight.status,
            changed_by,
            notes,
        );
        entry.location = location;
        _ = self
            .best_effort(
                freight.id,
                "insert `StatusHistoryEntry`",
                Insert(entry),
            )
            .await;
    }

    /// Winds down everything bound to the provided just cancelled
    /// [`Freight`]: its [`Assignment`]s and pending [`Proposal`]s are
    /// cancelled and the cancellation is recorded.
    ///
    /// Returns IDs of the drivers whose [`Assignment`]s are cancelled.
    pub(crate) async fn release(
        &self,
        freight: &Freight,
        changed_by: Option<user::Id>,
        notes: Option<status_history::Notes>,
    ) -> Vec<user::Id>
    where
        Db: Database<
                Select<By<Vec<Assignment>, freight::Id>>,
                Ok = Vec<Assignment>,
                Err = Traced<database::Error>,
            > + Database<
                Select<By<Vec<Proposal>, freight::Id>>,
                Ok = Vec<Proposal>,
                Err = Traced<database::Error>,
            > + Database<
                Update<Assignment>,
                Ok = (),
                Err = Traced<database::Error>,
            > + Database<
                Update<Proposal>,
                Ok = (),
                Err = Traced<database::Error>,
            > + Database<
                Insert<StatusHistoryEntry>,
                Ok = (),
                Err = Traced<database::Error>,
            >,
    {
        let mut drivers = vec![];

        let assignments = self
            .best_effort(
                freight.id,
                "select `Assignment`s",
                Select(By::<Vec<Assignment>, _>::new(freight.id)),
            )
            .await
            .unwrap_or_default();
        for mut a in assignments {
            if matches!(
                a.status,
                assignment::Status::Pending | assignment::Status::Accepted,
            ) {
                drivers.push(a.driver_id);
                a.set_status(assignment::Status::Cancelled);
                _ = self
                    .best_effort(freight.id, "cancel `Assignment`", Update(a))
                    .await;
            }
        }

        let proposals = self
            .best_effort(
                freight.id,
                "select `Proposal`s",
                Select(By::<Vec<Proposal>, _>::new(freight.id)),
            )
            .await
            .unwrap_or_default();
        for mut p in proposals.into_iter().filter(Proposal::is_pending) {
            p.set_status(proposal::Status::Cancelled);
            _ = self
                .best_effort(freight.id, "cancel `Proposal`", Update(p))
                .await;
        }

        self.record_status(freight, changed_by, notes, None).await;

        drivers
    }

    /// Completes the [`Assignment`]s of the provided just delivered
    /// [`Freight`] and hands it over to the payments and fiscal
    /// integrations.
    async fn settle(&self, freight: &Freight)
    where
        Db: Database<
                Select<By<Vec<Assignment>, freight::Id>>,
                Ok = Vec<Assignment>,
                Err = Traced<database::Error>,
            > + Database<
                Update<Assignment>,
                Ok = (),
                Err = Traced<database::Error>,
            >,
    {
        let Some(assignments) = self
            .best_effort(
                freight.id,
                "select `Assignment`s",
                Select(By::<Vec<Assignment>, _>::new(freight.id)),
            )
            .await
        else {
            return;
        };

        let payable = Money::sum(
            assignments
                .iter()
                .filter(|a| a.is_billable())
                .map(|a| a.agreed_price),
        );
        for mut a in assignments {
            if a.status == assignment::Status::Accepted {
                a.set_status(assignment::Status::Completed);
                _ = self
                    .best_effort(freight.id, "complete `Assignment`", Update(a))
                    .await;
            }
        }

        self.outbox.publish(Notification::FreightSettleable {
            freight_id: freight.id,
            producer_id: freight.producer_id,
            payable,
        });
    }
}
