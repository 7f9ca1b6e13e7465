//! [`Command`] for occupying a truck slot of a [`Freight`].

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        assignment,
        freight::{
            self, eligibility, pricing, Change, Ineligibility, Status,
            Transition,
        },
        proposal, user, Assignment, Freight, Proposal, StatusHistoryEntry,
        TrackingConsent, User,
    },
    infra::{database, outbox::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for occupying a truck slot of a [`Freight`] by a driver.
///
/// The slot is taken by a single conditional write, so concurrent requests
/// never take more slots than the [`Freight`] requires: the ones losing the
/// race fail with [`ExecutionError::Conflict`].
#[derive(Clone, Copy, Debug)]
pub struct Accept {
    /// ID of the [`Freight`] to occupy a slot of.
    pub freight_id: freight::Id,

    /// ID of the driver [`User`] taking the slot.
    pub driver_id: user::Id,

    /// ID of the transport company [`User`] the driver takes the slot for,
    /// if any.
    pub company_id: Option<user::Id>,

    /// ID of the [`User`] accepting.
    pub initiator_id: user::Id,

    /// [`Offer`] being accepted.
    pub offer: Offer,
}

/// Offer a [`Freight`] slot is taken on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Offer {
    /// Per-truck price listed by the [`Freight`], accepted by the carrier.
    ListPrice,

    /// Pending [`Proposal`] of the carrier, accepted by the producer.
    Proposal(proposal::Id),
}

impl<Db> Command<Accept> for Service<Db>
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
            Select<By<Option<TrackingConsent>, (freight::Id, user::Id)>>,
            Ok = Option<TrackingConsent>,
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
        > + Database<Insert<Assignment>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Proposal>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Update<proposal::Decision>,
            Ok = Option<Proposal>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = Freight;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: Accept) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Accept {
            freight_id,
            driver_id,
            company_id,
            initiator_id,
            offer,
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

        let driver = if driver_id == initiator.id {
            initiator.clone()
        } else {
            self.database()
                .execute(Select(By::<Option<User>, _>::new(driver_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(driver_id))
                .map_err(tracerr::wrap!())?
        };
        if company_id.is_some() && company_id != driver.company_id {
            return Err(tracerr::new!(E::Forbidden(initiator.id)));
        }

        let proposals = self
            .database()
            .execute(Select(By::<Vec<Proposal>, _>::new(freight.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let (price, accepted_proposal) = match offer {
            Offer::ListPrice => {
                if !initiator.may_act_for(&driver) {
                    return Err(tracerr::new!(E::Forbidden(initiator.id)));
                }
                let price = freight
                    .unit_price()
                    .map_err(tracerr::from_and_wrap!(=> E))?;
                (price, None)
            }
            Offer::Proposal(proposal_id) => {
                if !(freight.is_owned_by(&initiator)
                    || initiator.role == user::Role::Admin)
                {
                    return Err(tracerr::new!(E::NotOwner(initiator.id)));
                }
                let proposal = proposals
                    .iter()
                    .find(|p| p.id == proposal_id && p.driver_id == driver.id)
                    .ok_or(E::ProposalNotExists(proposal_id))
                    .map_err(tracerr::wrap!())?;
                if !proposal.is_pending() {
                    return Err(tracerr::new!(E::NotEligible(
                        Ineligibility::OfferNotPending
                    )));
                }
                (proposal.proposed_price, Some(proposal.clone()))
            }
        };
        pricing::check_price(price, freight.price_floor)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let consent = self
            .database()
            .execute(Select(By::<Option<TrackingConsent>, _>::new((
                freight.id, driver.id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let assignments = self
            .database()
            .execute(Select(By::<Vec<Assignment>, _>::new(freight.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        eligibility::check(&freight, &driver, consent.as_ref(), &assignments)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        if let Some(p) = &accepted_proposal {
            // Claimed before the slot is taken.
            _ = self
                .database()
                .execute(Update(proposal::Decision {
                    proposal_id: p.id,
                    status: proposal::Status::Accepted,
                }))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::NotEligible(Ineligibility::OfferNotPending))
                .map_err(tracerr::wrap!())?;
        }

        let occupied = self
            .database()
            .execute(Update(Transition::new(
                freight.id,
                Status::BIDDABLE,
                Change::Occupy {
                    driver_id: driver.id,
                    company_id: driver.company_id,
                },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .and_then(|f| {
                f.ok_or(E::Conflict(freight.id)).map_err(tracerr::wrap!())
            });
        let accepted = match occupied {
            Ok(f) => f,
            Err(e) => {
                if let Some(p) = accepted_proposal {
                    _ = self
                        .best_effort(
                            freight.id,
                            "restore `Proposal`",
                            Update(p),
                        )
                        .await;
                }
                return Err(e);
            }
        };

        self.occupied(
            &accepted,
            freight.status,
            &initiator,
            &driver,
            price,
            accepted_proposal.map(|p| p.id),
            proposals,
        )
        .await;

        Ok(accepted)
    }
}

impl<Db> Service<Db>
where
    Db: Database<Insert<Assignment>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Update<proposal::Decision>,
            Ok = Option<Proposal>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    /// Performs the side writes following an occupied [`Freight`] slot.
    #[expect(clippy::too_many_arguments, reason = "private helper")]
    async fn occupied(
        &self,
        freight: &Freight,
        previous_status: Status,
        initiator: &User,
        driver: &User,
        agreed_price: Money,
        accepted_proposal: Option<proposal::Id>,
        proposals: Vec<Proposal>,
    ) {
        let fully_staffed = freight.is_fully_staffed();

        // The accepted one is claimed already.
        for p in proposals
            .into_iter()
            .filter(|p| p.is_pending() && Some(p.id) != accepted_proposal)
        {
            let (status, operation) = if p.driver_id == driver.id {
                // Superseded by the accepted list price.
                (proposal::Status::Cancelled, "cancel `Proposal`")
            } else if fully_staffed {
                (proposal::Status::Rejected, "reject `Proposal`")
            } else {
                continue;
            };
            let rejected = (status == proposal::Status::Rejected)
                .then_some((p.id, p.driver_id));
            let decision = proposal::Decision {
                proposal_id: p.id,
                status,
            };
            // Skipped if decided concurrently.
            if self
                .best_effort(freight.id, operation, Update(decision))
                .await
                .flatten()
                .is_some()
            {
                if let Some((proposal_id, driver_id)) = rejected {
                    self.outbox.publish(Notification::ProposalRejected {
                        freight_id: freight.id,
                        proposal_id,
                        driver_id,
                    });
                }
            }
        }

        let now = assignment::CreationDateTime::now();
        _ = self
            .best_effort(
                freight.id,
                "insert `Assignment`",
                Insert(Assignment {
                    id: assignment::Id::new(),
                    freight_id: freight.id,
                    driver_id: driver.id,
                    company_id: driver.company_id,
                    status: assignment::Status::Accepted,
                    agreed_price,
                    created_at: now,
                    updated_at: now.coerce(),
                }),
            )
            .await;

        if freight.status != previous_status {
            self.record_status(freight, Some(initiator.id), None, None)
                .await;
        }

        self.outbox.publish(Notification::FreightAccepted {
            freight_id: freight.id,
            producer_id: freight.producer_id,
            driver_id: driver.id,
            company_id: driver.company_id,
            fully_staffed,
        });
    }
}

/// Error of [`Accept`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Another request took the last slot or changed the [`Freight`] first.
    #[display("`Freight(id: {_0})` changed concurrently")]
    #[from(ignore)]
    Conflict(#[error(not(source))] freight::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] may not accept on behalf of the driver.
    #[display("`User(id: {_0})` may not accept for this driver")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] user::Id),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// Accepted price is invalid.
    #[display("Invalid price: {_0}")]
    InvalidPrice(pricing::Error),

    /// Driver may not take a slot of the [`Freight`].
    #[display("Not eligible: {_0}")]
    NotEligible(Ineligibility),

    /// [`User`] doesn't own the [`Freight`].
    #[display("`User(id: {_0})` doesn't own the `Freight`")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] user::Id),

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
        domain::{
            assignment,
            freight::{self, Ineligibility, Status},
            user::Role,
            Assignment, Freight, StatusHistoryEntry,
        },
        infra::{outbox::Event, outbox::Notification, Database as _},
        spec, Command as _,
    };

    use super::{Accept, ExecutionError, Offer};

    #[tokio::test]
    async fn never_overbooks_under_concurrency() {
        let (svc, _events) = spec::service();
        let freight = freight::spec::freight(3);
        let freight_id = freight.id;
        spec::freight(&svc, freight.clone()).await;

        let mut drivers = vec![];
        for _ in 0..10 {
            let driver = spec::user(&svc, Role::Driver, None).await;
            spec::consent(&svc, &freight, &driver).await;
            drivers.push(driver);
        }

        let results = future::join_all(drivers.iter().map(|d| {
            svc.execute(Accept {
                freight_id,
                driver_id: d.id,
                company_id: None,
                initiator_id: d.id,
                offer: Offer::ListPrice,
            })
        }))
        .await;

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .filter(|e| {
                matches!(
                    e.as_ref(),
                    ExecutionError::Conflict(_)
                        | ExecutionError::NotEligible(
                            Ineligibility::FullyStaffed
                                | Ineligibility::NotBiddable(_)
                        ),
                )
            })
            .count();
        assert_eq!(accepted, 3);
        assert_eq!(conflicts, 7);

        let stored: Freight = svc
            .database()
            .execute(Select(By::<Option<Freight>, _>::new(freight_id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.accepted_trucks, 3);
        assert_eq!(stored.status, Status::Accepted);

        let assignments: Vec<Assignment> = svc
            .database()
            .execute(Select(By::<Vec<Assignment>, _>::new(freight_id)))
            .await
            .unwrap();
        assert_eq!(
            assignments
                .iter()
                .filter(|a| a.status == assignment::Status::Accepted)
                .count(),
            3,
        );
    }

    #[tokio::test]
    async fn single_truck_race_has_one_winner() {
        let (svc, mut events) = spec::service();
        let freight = freight::spec::freight(1);
        let freight_id = freight.id;
        spec::freight(&svc, freight.clone()).await;
        let a = spec::user(&svc, Role::Driver, None).await;
        let b = spec::user(&svc, Role::Driver, None).await;
        spec::consent(&svc, &freight, &a).await;
        spec::consent(&svc, &freight, &b).await;

        let accept = |driver_id| Accept {
            freight_id,
            driver_id,
            company_id: None,
            initiator_id: driver_id,
            offer: Offer::ListPrice,
        };
        let (ra, rb) =
            future::join(svc.execute(accept(a.id)), svc.execute(accept(b.id)))
                .await;

        let (winner, loser) = match (ra, rb) {
            (Ok(f), Err(e)) => {
                assert!(matches!(e.as_ref(), ExecutionError::Conflict(_)));
                (f, b.id)
            }
            (Err(e), Ok(f)) => {
                assert!(matches!(e.as_ref(), ExecutionError::Conflict(_)));
                (f, a.id)
            }
            (ra, rb) => panic!("expected exactly one winner: {ra:?}, {rb:?}"),
        };
        assert_eq!(winner.status, Status::Accepted);
        assert_ne!(winner.driver_id, Some(loser));
        assert!(winner.driver_id.is_some());

        let retry = svc.execute(accept(loser)).await.unwrap_err();
        assert!(matches!(
            retry.as_ref(),
            ExecutionError::NotEligible(Ineligibility::NotBiddable(
                Status::Accepted
            )),
        ));

        let history: Vec<StatusHistoryEntry> = svc
            .database()
            .execute(Select(By::<Vec<StatusHistoryEntry>, _>::new(freight_id)))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, Status::Accepted);

        assert!(matches!(
            events.try_recv(),
            Some(Event::Notification(Notification::FreightAccepted {
                fully_staffed: true,
                ..
            })),
        ));
    }

    #[tokio::test]
    async fn double_submit_occupies_one_slot() {
        let (svc, _events) = spec::service();
        let freight = freight::spec::freight(2);
        let freight_id = freight.id;
        spec::freight(&svc, freight.clone()).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        spec::consent(&svc, &freight, &driver).await;

        let accept = Accept {
            freight_id,
            driver_id: driver.id,
            company_id: None,
            initiator_id: driver.id,
            offer: Offer::ListPrice,
        };
        let (ra, rb) =
            future::join(svc.execute(accept), svc.execute(accept)).await;

        let failed = match (ra, rb) {
            (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
            (ra, rb) => panic!("expected exactly one success: {ra:?}, {rb:?}"),
        };
        assert!(matches!(
            failed.as_ref(),
            ExecutionError::Conflict(_)
                | ExecutionError::NotEligible(Ineligibility::AlreadyAssigned(
                    _
                )),
        ));

        let stored = spec::stored(&svc, freight_id).await;
        assert_eq!(stored.accepted_trucks, 1);
        assert_eq!(stored.status, Status::Open);

        let retry = svc.execute(accept).await.unwrap_err();
        assert!(matches!(
            retry.as_ref(),
            ExecutionError::NotEligible(Ineligibility::AlreadyAssigned(_)),
        ));

        let assignments: Vec<Assignment> = svc
            .database()
            .execute(Select(By::<Vec<Assignment>, _>::new(freight_id)))
            .await
            .unwrap();
        assert_eq!(
            assignments.iter().filter(|a| a.driver_id == driver.id).count(),
            1,
        );
    }

    #[tokio::test]
    async fn checks_preconditions() {
        let (svc, _events) = spec::service();
        let freight = freight::spec::freight(1);
        spec::freight(&svc, freight.clone()).await;
        let driver = spec::user(&svc, Role::Driver, None).await;

        let err = svc
            .execute(Accept {
                freight_id: freight.id,
                driver_id: driver.id,
                company_id: None,
                initiator_id: driver.id,
                offer: Offer::ListPrice,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotEligible(Ineligibility::NoTrackingConsent(_)),
        ));
    }

    #[tokio::test]
    async fn company_accepts_only_for_own_drivers() {
        let (svc, _events) = spec::service();
        let freight = freight::spec::freight(2);
        spec::freight(&svc, freight.clone()).await;
        let company = spec::user(&svc, Role::Company, None).await;
        let own = spec::user(&svc, Role::Driver, Some(company.id)).await;
        let other = spec::user(&svc, Role::Driver, None).await;
        spec::consent(&svc, &freight, &own).await;
        spec::consent(&svc, &freight, &other).await;

        let accept = |driver_id| Accept {
            freight_id: freight.id,
            driver_id,
            company_id: None,
            initiator_id: company.id,
            offer: Offer::ListPrice,
        };

        let err = svc.execute(accept(other.id)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));

        let freight = svc.execute(accept(own.id)).await.unwrap();
        assert_eq!(freight.accepted_trucks, 1);
        assert_eq!(freight.status, Status::Open);

        let assignments: Vec<Assignment> = svc
            .database()
            .execute(Select(By::<Vec<Assignment>, _>::new(freight.id)))
            .await
            .unwrap();
        assert_eq!(assignments[0].company_id, Some(company.id));
    }
}
