//! [`Command`] for accepting a price [`Proposal`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{proposal, user, Freight, Proposal},
    infra::{database, Database},
    Service,
};

use super::{
    accept::{self, Offer},
    Accept, Command,
};

/// [`Command`] for accepting a pending [`Proposal`] by the producer owning
/// its [`Freight`].
///
/// The proposing driver takes a truck slot with the proposed price agreed.
#[derive(Clone, Copy, Debug)]
pub struct AcceptProposal {
    /// ID of the [`Proposal`] to accept.
    pub proposal_id: proposal::Id,

    /// ID of the [`User`] accepting the [`Proposal`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,
}

impl<Db> Command<AcceptProposal> for Service<Db>
where
    Db: Database<
        Select<By<Option<Proposal>, proposal::Id>>,
        Ok = Option<Proposal>,
        Err = Traced<database::Error>,
    >,
    Self: Command<Accept, Ok = Freight, Err = Traced<ExecutionError>>,
{
    type Ok = Freight;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AcceptProposal,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AcceptProposal {
            proposal_id,
            initiator_id,
        } = cmd;

        let proposal = self
            .database()
            .execute(Select(By::<Option<Proposal>, _>::new(proposal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProposalNotExists(proposal_id))
            .map_err(tracerr::wrap!())?;

        self.execute(Accept {
            freight_id: proposal.freight_id,
            driver_id: proposal.driver_id,
            company_id: proposal.company_id,
            initiator_id,
            offer: Offer::Proposal(proposal.id),
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

/// Error of [`AcceptProposal`] [`Command`] execution.
pub type ExecutionError = accept::ExecutionError;

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        Money,
    };

    use crate::{
        domain::{
            freight::{self, Status},
            proposal,
            user::Role,
            Assignment, Proposal,
        },
        infra::Database as _,
        spec, Command as _,
    };

    use super::{AcceptProposal, ExecutionError};

    #[tokio::test]
    async fn agrees_on_proposed_price() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let mut freight = freight::spec::freight(2);
        freight.producer_id = producer.id;
        freight.status = Status::InNegotiation;
        spec::freight(&svc, freight.clone()).await;

        let mut proposals = vec![];
        for price in ["900BRL", "950BRL"] {
            let driver = spec::user(&svc, Role::Driver, None).await;
            spec::consent(&svc, &freight, &driver).await;
            let proposal = Proposal {
                id: proposal::Id::new(),
                freight_id: freight.id,
                driver_id: driver.id,
                company_id: None,
                status: proposal::Status::Pending,
                proposed_price: price.parse::<Money>().unwrap(),
                message: None,
                created_at: proposal::CreationDateTime::now(),
                updated_at: proposal::ModificationDateTime::now(),
            };
            svc.database()
                .execute(Insert(proposal.clone()))
                .await
                .unwrap();
            proposals.push(proposal);
        }

        let stranger = spec::user(&svc, Role::Producer, None).await;
        let err = svc
            .execute(AcceptProposal {
                proposal_id: proposals[0].id,
                initiator_id: stranger.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        let updated = svc
            .execute(AcceptProposal {
                proposal_id: proposals[0].id,
                initiator_id: producer.id,
            })
            .await
            .unwrap();
        assert_eq!(updated.accepted_trucks, 1);
        assert_eq!(updated.status, Status::InNegotiation);

        let assignments: Vec<Assignment> = svc
            .database()
            .execute(Select(By::<Vec<Assignment>, _>::new(freight.id)))
            .await
            .unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].agreed_price, proposals[0].proposed_price);

        let stored: Vec<Proposal> = svc
            .database()
            .execute(Select(By::<Vec<Proposal>, _>::new(freight.id)))
            .await
            .unwrap();
        let status_of = |id| {
            stored.iter().find(|p| p.id == id).map(|p| p.status).unwrap()
        };
        assert_eq!(status_of(proposals[0].id), proposal::Status::Accepted);
        assert_eq!(status_of(proposals[1].id), proposal::Status::Pending);

        let err = svc
            .execute(AcceptProposal {
                proposal_id: proposals[0].id,
                initiator_id: producer.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotEligible(_)));
    }

    #[tokio::test]
    async fn full_staffing_rejects_the_rest() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let mut freight = freight::spec::freight(1);
        freight.producer_id = producer.id;
        freight.status = Status::InNegotiation;
        spec::freight(&svc, freight.clone()).await;

        let mut ids = vec![];
        for _ in 0..2 {
            let driver = spec::user(&svc, Role::Driver, None).await;
            spec::consent(&svc, &freight, &driver).await;
            let proposal = Proposal {
                id: proposal::Id::new(),
                freight_id: freight.id,
                driver_id: driver.id,
                company_id: None,
                status: proposal::Status::Pending,
                proposed_price: "800BRL".parse::<Money>().unwrap(),
                message: None,
                created_at: proposal::CreationDateTime::now(),
                updated_at: proposal::ModificationDateTime::now(),
            };
            ids.push(proposal.id);
            svc.database().execute(Insert(proposal)).await.unwrap();
        }

        let updated = svc
            .execute(AcceptProposal {
                proposal_id: ids[1],
                initiator_id: producer.id,
            })
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Accepted);

        let stored: Vec<Proposal> = svc
            .database()
            .execute(Select(By::<Vec<Proposal>, _>::new(freight.id)))
            .await
            .unwrap();
        let rejected = stored.iter().find(|p| p.id == ids[0]).unwrap();
        assert_eq!(rejected.status, proposal::Status::Rejected);
    }
}
