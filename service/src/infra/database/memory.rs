//! In-memory [`Database`] implementation.
//!
//! Keeps the whole state behind a single mutex, so each operation is atomic
//! on its own, while nothing spans several operations.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{
        assignment, freight, proposal, user, Assignment, Freight, Proposal,
        StatusHistoryEntry, TrackingConsent, User,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`].
///
/// Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<State>>);

/// State of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    users: HashMap<user::Id, User>,
    freights: HashMap<freight::Id, Freight>,
    assignments: Vec<Assignment>,
    proposals: Vec<Proposal>,
    history: Vec<StatusHistoryEntry>,
    consents: HashMap<(freight::Id, user::Id), TrackingConsent>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the [`State`] after yielding to other tasks, so concurrent
    /// operations interleave the way they do with a real database.
    async fn state(&self) -> MutexGuard<'_, State> {
        tokio::task::yield_now().await;
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.users.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.users.insert(user.id, user);
        Ok(())
    }
}

impl Database<Select<By<Option<Freight>, freight::Id>>> for Memory {
    type Ok = Option<Freight>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Freight>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.freights.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Freight>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(freight): Insert<Freight>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.freights.insert(freight.id, freight);
        Ok(())
    }
}

impl Database<Update<freight::Transition>> for Memory {
    type Ok = Option<Freight>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(transition): Update<freight::Transition>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        Ok(state
            .freights
            .get_mut(&transition.freight_id)
            .and_then(|f| transition.apply_to(f).then(|| f.clone())))
    }
}

impl Database<Select<By<Vec<Freight>, read::freight::list::Filter>>>
    for Memory
{
    type Ok = Vec<Freight>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Freight>, read::freight::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::freight::list::Filter {
            statuses,
            producer_id,
            carrier_id,
            created_before,
        } = by.into_inner();

        let state = self.state().await;
        let is_carried_by = |f: &Freight, carrier: user::Id| {
            f.driver_id == Some(carrier)
                || f.company_id == Some(carrier)
                || state.assignments.iter().any(|a| {
                    a.freight_id == f.id
                        && a.status != assignment::Status::Cancelled
                        && (a.driver_id == carrier
                            || a.company_id == Some(carrier))
                })
        };

        let mut freights = state
            .freights
            .values()
            .filter(|f| {
                statuses.as_ref().map_or(true, |s| s.contains(&f.status))
                    && producer_id.map_or(true, |id| f.producer_id == id)
                    && carrier_id.map_or(true, |id| is_carried_by(f, id))
                    && created_before.map_or(true, |at| f.created_at < at)
            })
            .cloned()
            .collect::<Vec<_>>();
        freights.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
        });
        Ok(freights)
    }
}

impl Database<Insert<Assignment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(assignment): Insert<Assignment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(assignment)).await
    }
}

impl Database<Update<Assignment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(assignment): Update<Assignment>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        match state.assignments.iter_mut().find(|a| a.id == assignment.id) {
            Some(existing) => *existing = assignment,
            None => state.assignments.push(assignment),
        }
        Ok(())
    }
}

impl Database<Select<By<Vec<Assignment>, freight::Id>>> for Memory {
    type Ok = Vec<Assignment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Assignment>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .await
            .assignments
            .iter()
            .filter(|a| a.freight_id == id)
            .cloned()
            .collect())
    }
}

impl Database<Select<By<Option<Proposal>, proposal::Id>>> for Memory {
    type Ok = Option<Proposal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Proposal>, proposal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .await
            .proposals
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }
}

impl Database<Select<By<Vec<Proposal>, freight::Id>>> for Memory {
    type Ok = Vec<Proposal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Proposal>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .await
            .proposals
            .iter()
            .filter(|p| p.freight_id == id)
            .cloned()
            .collect())
    }
}

impl Database<Insert<Proposal>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(proposal): Insert<Proposal>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(proposal)).await
    }
}

impl Database<Update<Proposal>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(proposal): Update<Proposal>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        // One proposal per driver and freight.
        match state.proposals.iter_mut().find(|p| {
            p.freight_id == proposal.freight_id
                && p.driver_id == proposal.driver_id
        }) {
            Some(existing) => {
                *existing = Proposal {
                    id: existing.id,
                    created_at: existing.created_at,
                    ..proposal
                };
            }
            None => state.proposals.push(proposal),
        }
        Ok(())
    }
}

impl Database<Update<proposal::Decision>> for Memory {
    type Ok = Option<Proposal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(decision): Update<proposal::Decision>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .await
            .proposals
            .iter_mut()
            .find(|p| p.id == decision.proposal_id)
            .and_then(|p| decision.apply_to(p).then(|| p.clone())))
    }
}

impl Database<Insert<StatusHistoryEntry>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<StatusHistoryEntry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().await.history.push(entry);
        Ok(())
    }
}

impl Database<Select<By<Vec<StatusHistoryEntry>, freight::Id>>> for Memory {
    type Ok = Vec<StatusHistoryEntry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<StatusHistoryEntry>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .await
            .history
            .iter()
            .filter(|e| e.freight_id == id)
            .cloned()
            .collect())
    }
}

impl Database<Insert<TrackingConsent>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(consent): Insert<TrackingConsent>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self
            .state()
            .await
            .consents
            .entry((consent.freight_id, consent.driver_id))
            .or_insert(consent);
        Ok(())
    }
}

impl Database<Select<By<Option<TrackingConsent>, (freight::Id, user::Id)>>>
    for Memory
{
    type Ok = Option<TrackingConsent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<TrackingConsent>, (freight::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.consents.get(&by.into_inner()).copied())
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select, Update};
    use futures::future;

    use crate::{
        domain::{
            freight::{self, Change, Status, Transition},
            proposal, user, Freight, Proposal,
        },
        infra::Database as _,
        read,
    };

    use super::Memory;

    #[tokio::test]
    async fn transition_is_conditional() {
        let db = Memory::new();
        let freight = freight::spec::freight(1);
        let id = freight.id;
        db.execute(Insert(freight)).await.unwrap();

        let cancel = || {
            Transition::new(
                id,
                Status::BIDDABLE,
                Change::Status(Status::Cancelled),
            )
        };

        let updated = db.execute(Update(cancel())).await.unwrap();
        assert_eq!(updated.map(|f| f.status), Some(Status::Cancelled));

        assert!(db.execute(Update(cancel())).await.unwrap().is_none());

        let stored = db
            .execute(Select(By::<Option<Freight>, _>::new(id)))
            .await
            .unwrap();
        assert_eq!(stored.unwrap().status, Status::Cancelled);
    }

    #[tokio::test]
    async fn concurrent_occupations_never_overbook() {
        let db = Memory::new();
        let freight = freight::spec::freight(3);
        let id = freight.id;
        db.execute(Insert(freight)).await.unwrap();

        let results = future::join_all((0..8).map(|_| {
            db.execute(Update(Transition::new(
                id,
                Status::BIDDABLE,
                Change::Occupy {
                    driver_id: user::Id::new(),
                    company_id: None,
                },
            )))
        }))
        .await;

        let occupied = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Some(_))))
            .count();
        assert_eq!(occupied, 3);

        let stored = db
            .execute(Select(By::<Option<Freight>, _>::new(id)))
            .await
            .unwrap();
        let stored = stored.unwrap();
        assert_eq!(stored.accepted_trucks, 3);
        assert_eq!(stored.status, Status::Accepted);
    }

    #[tokio::test]
    async fn same_driver_occupies_one_slot() {
        let db = Memory::new();
        let freight = freight::spec::freight(3);
        let id = freight.id;
        db.execute(Insert(freight)).await.unwrap();

        let driver_id = user::Id::new();
        let results = future::join_all((0..4).map(|_| {
            db.execute(Update(Transition::new(
                id,
                Status::BIDDABLE,
                Change::Occupy {
                    driver_id,
                    company_id: None,
                },
            )))
        }))
        .await;

        let occupied = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Some(_))))
            .count();
        assert_eq!(occupied, 1);

        let stored = db
            .execute(Select(By::<Option<Freight>, _>::new(id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.accepted_trucks, 1);
        assert_eq!(stored.occupant_ids, [driver_id]);
        assert_eq!(stored.status, Status::Open);
    }

    #[tokio::test]
    async fn decides_only_pending_proposals() {
        let db = Memory::new();
        let proposal = Proposal {
            id: proposal::Id::new(),
            freight_id: freight::Id::new(),
            driver_id: user::Id::new(),
            company_id: None,
            status: proposal::Status::Pending,
            proposed_price: "900BRL".parse().unwrap(),
            message: None,
            created_at: proposal::CreationDateTime::now(),
            updated_at: proposal::ModificationDateTime::now(),
        };
        let id = proposal.id;
        db.execute(Insert(proposal)).await.unwrap();

        let decide = |status| {
            Update(proposal::Decision {
                proposal_id: id,
                status,
            })
        };
        let accepted = db
            .execute(decide(proposal::Status::Accepted))
            .await
            .unwrap();
        assert_eq!(
            accepted.map(|p| p.status),
            Some(proposal::Status::Accepted),
        );

        assert!(db
            .execute(decide(proposal::Status::Rejected))
            .await
            .unwrap()
            .is_none());
        let stored = db
            .execute(Select(By::<Option<Proposal>, _>::new(id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, proposal::Status::Accepted);
    }

    #[tokio::test]
    async fn lists_most_recent_first() {
        let db = Memory::new();
        let producer_id = user::Id::new();
        let mut older = freight::spec::freight(1);
        older.producer_id = producer_id;
        older.created_at =
            older.created_at - std::time::Duration::from_secs(60);
        let mut newer = freight::spec::freight(1);
        newer.producer_id = producer_id;
        let foreign = freight::spec::freight(1);
        let (older_id, newer_id) = (older.id, newer.id);
        for f in [older, newer, foreign] {
            db.execute(Insert(f)).await.unwrap();
        }

        let list: Vec<Freight> = db
            .execute(Select(By::new(read::freight::list::Filter {
                producer_id: Some(producer_id),
                ..read::freight::list::Filter::default()
            })))
            .await
            .unwrap();

        assert_eq!(
            list.iter().map(|f| f.id).collect::<Vec<_>>(),
            [newer_id, older_id],
        );
    }
}
