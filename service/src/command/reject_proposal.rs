//! [`Command`] for rejecting a [`Proposal`].

use common::operations::{By, Insert, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        freight::{self, Change, Status, Transition},
        proposal,
        user::{self, Role},
        Freight, Proposal, StatusHistoryEntry, User,
    },
    infra::{database, outbox::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for rejecting a pending [`Proposal`] by the producer owning
/// its [`Freight`].
///
/// A [`Freight`] left without pending [`Proposal`]s goes back from
/// [`Status::InNegotiation`] to [`Status::Open`].
#[derive(Clone, Copy, Debug)]
pub struct RejectProposal {
    /// ID of the [`Proposal`] to reject.
    pub proposal_id: proposal::Id,

    /// ID of the [`User`] rejecting.
    pub initiator_id: user::Id,
}

impl<Db> Command<RejectProposal> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Proposal>, proposal::Id>>,
            Ok = Option<Proposal>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Freight>, freight::Id>>,
            Ok = Option<Freight>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Proposal>, freight::Id>>,
            Ok = Vec<Proposal>,
            Err = Traced<database::Error>,
        > + Database<
            Update<proposal::Decision>,
            Ok = Option<Proposal>,
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
    type Ok = Proposal;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RejectProposal,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RejectProposal {
            proposal_id,
            initiator_id,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;

        let proposal = self
            .database()
            .execute(Select(By::<Option<Proposal>, _>::new(proposal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProposalNotExists(proposal_id))
            .map_err(tracerr::wrap!())?;

        let freight = self
            .database()
            .execute(Select(By::<Option<Freight>, _>::new(proposal.freight_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::FreightNotExists(proposal.freight_id))
            .map_err(tracerr::wrap!())?;
        if initiator.role != Role::Admin && !freight.is_owned_by(&initiator) {
            return Err(tracerr::new!(E::NotOwner(initiator.id)));
        }

        if !proposal.is_pending() {
            return Err(tracerr::new!(E::NotPending(proposal.status)));
        }
        let Some(proposal) = self
            .database()
            .execute(Update(proposal::Decision {
                proposal_id: proposal.id,
                status: proposal::Status::Rejected,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        else {
            // Decided concurrently.
            let current = self
                .database()
                .execute(Select(By::<Option<Proposal>, _>::new(proposal.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .map_or(proposal.status, |p| p.status);
            return Err(tracerr::new!(E::NotPending(current)));
        };

        self.outbox.publish(Notification::ProposalRejected {
            freight_id: freight.id,
            proposal_id: proposal.id,
            driver_id: proposal.driver_id,
        });

        if freight.status == Status::InNegotiation {
            let pending = self
                .best_effort(
                    freight.id,
                    "select `Proposal`s",
                    Select(By::<Vec<Proposal>, _>::new(freight.id)),
                )
                .await
                .map(|ps| ps.iter().any(Proposal::is_pending));
            if pending == Some(false) {
                let reopened = self
                    .best_effort(
                        freight.id,
                        "reopen negotiated `Freight`",
                        Update(Transition::new(
                            freight.id,
                            [Status::InNegotiation],
                            Change::Status(Status::Open),
                        )),
                    )
                    .await
                    .flatten();
                if let Some(freight) = reopened {
                    self.record_status(
                        &freight,
                        Some(initiator.id),
                        None,
                        None,
                    )
                    .await;
                }
            }
        }

        Ok(proposal)
    }
}

/// Error of [`RejectProposal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// [`User`] doesn't own the [`Freight`].
    #[display("`User(id: {_0})` doesn't own the `Freight`")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Proposal`] is already decided.
    #[display("`Proposal` is already `{_0}`")]
    #[from(ignore)]
    NotPending(#[error(not(source))] proposal::Status),

    /// [`Proposal`] with the provided ID does not exist.
    #[display("`Proposal(id: {_0})` does not exist")]
    #[from(ignore)]
    ProposalNotExists(#[error(not(source))] proposal::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use futures::future;

    use crate::{
        command::{AcceptProposal, ProposePrice},
        domain::{
            freight::{self, Status},
            proposal,
            user::Role,
            Assignment, Proposal,
        },
        infra::{
            outbox::{Event, Notification},
            Database as _,
        },
        spec, Command as _,
    };

    use super::{ExecutionError, RejectProposal};

    #[tokio::test]
    async fn last_rejection_reopens_the_market() {
        let (svc, mut events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        spec::freight(&svc, freight.clone()).await;

        let mut proposals = vec![];
        for price in ["900BRL", "950BRL"] {
            let driver = spec::user(&svc, Role::Driver, None).await;
            spec::consent(&svc, &freight, &driver).await;
            proposals.push(
                svc.execute(ProposePrice {
                    freight_id: freight.id,
                    driver_id: driver.id,
                    initiator_id: driver.id,
                    price: price.parse().unwrap(),
                    message: None,
                })
                .await
                .unwrap(),
            );
        }
        while events.try_recv().is_some() {}

        let rejected = svc
            .execute(RejectProposal {
                proposal_id: proposals[0].id,
                initiator_id: producer.id,
            })
            .await
            .unwrap();
        assert_eq!(rejected.status, proposal::Status::Rejected);
        assert_eq!(
            spec::stored(&svc, freight.id).await.status,
            Status::InNegotiation,
        );
        assert!(matches!(
            events.try_recv(),
            Some(Event::Notification(Notification::ProposalRejected { .. })),
        ));

        _ = svc
            .execute(RejectProposal {
                proposal_id: proposals[1].id,
                initiator_id: producer.id,
            })
            .await
            .unwrap();
        assert_eq!(
            spec::stored(&svc, freight.id).await.status,
            Status::Open,
        );

        let err = svc
            .execute(RejectProposal {
                proposal_id: proposals[1].id,
                initiator_id: producer.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotPending(proposal::Status::Rejected),
        ));
    }

    #[tokio::test]
    async fn only_owner_rejects() {
        let (svc, _events) = spec::service();
        let freight = freight::spec::freight(1);
        spec::freight(&svc, freight.clone()).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        spec::consent(&svc, &freight, &driver).await;
        let proposal = svc
            .execute(ProposePrice {
                freight_id: freight.id,
                driver_id: driver.id,
                initiator_id: driver.id,
                price: "900BRL".parse().unwrap(),
                message: None,
            })
            .await
            .unwrap();

        let stranger = spec::user(&svc, Role::Producer, None).await;
        let err = svc
            .execute(RejectProposal {
                proposal_id: proposal.id,
                initiator_id: stranger.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        let admin = spec::user(&svc, Role::Admin, None).await;
        _ = svc
            .execute(RejectProposal {
                proposal_id: proposal.id,
                initiator_id: admin.id,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn never_overturns_concurrent_acceptance() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        spec::freight(&svc, freight.clone()).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        spec::consent(&svc, &freight, &driver).await;
        let proposal = svc
            .execute(ProposePrice {
                freight_id: freight.id,
                driver_id: driver.id,
                initiator_id: driver.id,
                price: "900BRL".parse().unwrap(),
                message: None,
            })
            .await
            .unwrap();

        let (accepted, rejected) = future::join(
            svc.execute(AcceptProposal {
                proposal_id: proposal.id,
                initiator_id: producer.id,
            }),
            svc.execute(RejectProposal {
                proposal_id: proposal.id,
                initiator_id: producer.id,
            }),
        )
        .await;
        assert_ne!(accepted.is_ok(), rejected.is_ok());

        let stored = svc
            .database()
            .execute(Select(By::<Option<Proposal>, _>::new(proposal.id)))
            .await
            .unwrap()
            .unwrap();
        let assignments: Vec<Assignment> = svc
            .database()
            .execute(Select(By::<Vec<Assignment>, _>::new(freight.id)))
            .await
            .unwrap();
        if accepted.is_ok() {
            assert_eq!(stored.status, proposal::Status::Accepted);
            assert_eq!(assignments.len(), 1);
            assert!(matches!(
                rejected.unwrap_err().as_ref(),
                ExecutionError::NotPending(proposal::Status::Accepted),
            ));
        } else {
            assert_eq!(stored.status, proposal::Status::Rejected);
            assert!(assignments.is_empty());
        }
    }
}
