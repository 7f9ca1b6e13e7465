//! [`Command`] for proposing a price on a [`Freight`].

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
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

/// [`Command`] for proposing a per-truck price on a [`Freight`] by a
/// carrier.
///
/// Re-proposing replaces the driver's pending [`Proposal`].
#[derive(Clone, Debug)]
pub struct ProposePrice {
    /// ID of the [`Freight`] to propose the price on.
    pub freight_id: freight::Id,

    /// ID of the driver [`User`] who would carry the [`Freight`].
    pub driver_id: user::Id,

    /// ID of the [`User`] proposing: the driver or its company.
    pub initiator_id: user::Id,

    /// Proposed per-truck price.
    pub price: Money,

    /// Message to the producer, if any.
    pub message: Option<proposal::Message>,
}

impl<Db> Command<ProposePrice> for Service<Db>
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
        > + Database<Insert<Proposal>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = Proposal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ProposePrice) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ProposePrice {
            freight_id,
            driver_id,
            initiator_id,
            price,
            message,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
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
        if !initiator.may_act_for(&driver) {
            return Err(tracerr::new!(E::Forbidden(initiator.id)));
        }

        let freight = self
            .database()
            .execute(Select(By::<Option<Freight>, _>::new(freight_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::FreightNotExists(freight_id))
            .map_err(tracerr::wrap!())?;

        pricing::check_price(price, freight.price_floor)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let listed = freight
            .unit_price()
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if listed.currency != price.currency {
            return Err(tracerr::new!(E::InvalidPrice(
                pricing::Error::CurrencyMismatch {
                    price,
                    expected: listed,
                }
            )));
        }

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

        let existing = self
            .database()
            .execute(Select(By::<Vec<Proposal>, _>::new(freight.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|p| p.driver_id == driver.id);
        if existing.as_ref().is_some_and(|p| {
            !matches!(
                p.status,
                proposal::Status::Pending | proposal::Status::Cancelled,
            )
        }) {
            return Err(tracerr::new!(E::NotEligible(
                Ineligibility::OfferNotPending
            )));
        }

        let negotiating = if freight.status == Status::Open {
            let transitioned = self
                .database()
                .execute(Update(Transition::new(
                    freight.id,
                    [Status::Open],
                    Change::Status(Status::InNegotiation),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if transitioned.is_none() {
                // Someone else may have opened the negotiation first.
                let current = self
                    .database()
                    .execute(Select(By::<Option<Freight>, _>::new(freight.id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::FreightNotExists(freight.id))
                    .map_err(tracerr::wrap!())?;
                if current.status != Status::InNegotiation {
                    return Err(tracerr::new!(E::Conflict(freight.id)));
                }
            }
            transitioned
        } else {
            None
        };

        let now = proposal::ModificationDateTime::now();
        let proposal = Proposal {
            id: existing.as_ref().map_or_else(proposal::Id::new, |p| p.id),
            freight_id: freight.id,
            driver_id: driver.id,
            company_id: driver.company_id,
            status: proposal::Status::Pending,
            proposed_price: price,
            message,
            created_at: existing
                .as_ref()
                .map_or_else(|| now.coerce(), |p| p.created_at),
            updated_at: now,
        };
        self.database()
            .execute(Insert(proposal.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Some(freight) = &negotiating {
            self.record_status(freight, Some(initiator.id), None, None)
                .await;
        }

        self.outbox.publish(Notification::ProposalReceived {
            freight_id: freight.id,
            producer_id: freight.producer_id,
            proposal_id: proposal.id,
            price,
        });

        Ok(proposal)
    }
}

/// Error of [`ProposePrice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Freight`] left the market concurrently.
    #[display("`Freight(id: {_0})` changed concurrently")]
    #[from(ignore)]
    Conflict(#[error(not(source))] freight::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] may not propose on behalf of the driver.
    #[display("`User(id: {_0})` may not propose for this driver")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] user::Id),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// Proposed price is invalid.
    #[display("Invalid price: {_0}")]
    InvalidPrice(pricing::Error),

    /// Driver may not bid on the [`Freight`].
    #[display("Not eligible: {_0}")]
    NotEligible(Ineligibility),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Money,
    };

    use crate::{
        domain::{
            freight::{self, pricing, Status},
            proposal,
            user::Role,
            Freight, Proposal,
        },
        infra::{
            outbox::{Event, Notification},
            Database as _,
        },
        spec, Command as _,
    };

    use super::{ExecutionError, ProposePrice};

    #[tokio::test]
    async fn opens_negotiation_once() {
        let (svc, mut events) = spec::service();
        let freight = freight::spec::freight(1);
        spec::freight(&svc, freight.clone()).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        spec::consent(&svc, &freight, &driver).await;

        let propose = |price: &str| ProposePrice {
            freight_id: freight.id,
            driver_id: driver.id,
            initiator_id: driver.id,
            price: price.parse::<Money>().unwrap(),
            message: proposal::Message::new("Posso buscar amanhã"),
        };

        let first = svc.execute(propose("900BRL")).await.unwrap();
        let second = svc.execute(propose("850BRL")).await.unwrap();
        assert_eq!(first.id, second.id);

        let stored: Freight = svc
            .database()
            .execute(Select(By::<Option<Freight>, _>::new(freight.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Status::InNegotiation);

        let proposals: Vec<Proposal> = svc
            .database()
            .execute(Select(By::<Vec<Proposal>, _>::new(freight.id)))
            .await
            .unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].proposed_price, "850BRL".parse().unwrap());

        assert!(matches!(
            events.try_recv(),
            Some(Event::Notification(Notification::ProposalReceived { .. })),
        ));
    }

    #[tokio::test]
    async fn refuses_price_under_floor() {
        let (svc, _events) = spec::service();
        let mut freight = freight::spec::freight(1);
        freight.price_floor = Some("700BRL".parse().unwrap());
        spec::freight(&svc, freight.clone()).await;
        let driver = spec::user(&svc, Role::Driver, None).await;
        spec::consent(&svc, &freight, &driver).await;

        let err = svc
            .execute(ProposePrice {
                freight_id: freight.id,
                driver_id: driver.id,
                initiator_id: driver.id,
                price: "650BRL".parse().unwrap(),
                message: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPrice(pricing::Error::BelowFloor { .. }),
        ));
    }
}
