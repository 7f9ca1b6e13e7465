//! [`ExpireFreights`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Insert, Perform, Select, Start, Update};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        freight::{self, Category, Change, Status, Transition},
        status_history, Assignment, Freight, Proposal, StatusHistoryEntry,
    },
    infra::{database, outbox::Notification, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`ExpireFreights`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between expiration sweeps.
    pub interval: time::Duration,
}

/// [`Task`] for cancelling [`Freight`]s staying on the market longer than
/// their [`Category`] allows.
#[derive(Clone, Copy, Debug)]
pub struct ExpireFreights<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpireFreights<Self>, Config>>> for Service<Db>
where
    ExpireFreights<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireFreights<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireFreights {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ExpireFreights` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ExpireFreights<Service<Db>>
where
    Db: Database<
            Select<By<Vec<Freight>, read::freight::list::Filter>>,
            Ok = Vec<Freight>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Transition>,
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
        > + Database<Update<Assignment>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Proposal>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Insert<StatusHistoryEntry>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = freight::ExpirationDateTime::now();
        // Nothing created later may have expired yet.
        let created_before = (now - Category::min_ttl()).coerce();

        let candidates = self
            .service
            .database()
            .execute(Select(By::new(read::freight::list::Filter {
                statuses: Some(Status::BIDDABLE.to_vec()),
                created_before: Some(created_before),
                ..read::freight::list::Filter::default()
            })))
            .await
            .map_err(tracerr::wrap!())?;

        let mut expired = 0_usize;
        for freight in candidates.into_iter().filter(|f| f.is_expired(now)) {
            let mut expire = Transition::new(
                freight.id,
                Status::BIDDABLE,
                Change::Status(Status::Cancelled),
            );
            // Nobody may have committed in the meantime.
            expire.expected.accepted_trucks = Some(0);

            let cancelled = match self
                .service
                .database()
                .execute(Update(expire))
                .await
            {
                Ok(Some(f)) => f,
                // Left the market concurrently.
                Ok(None) => continue,
                Err(e) => {
                    log::error!(
                        "failed to expire `Freight(id: {})`: {e}",
                        freight.id,
                    );
                    continue;
                }
            };

            let reason = status_history::Notes::new("expired");
            _ = self.service.release(&cancelled, None, reason).await;
            self.service.outbox().publish(Notification::FreightExpired {
                freight_id: cancelled.id,
                producer_id: cancelled.producer_id,
            });
            expired += 1;
        }
        if expired > 0 {
            log::info!("{expired} `Freight`s expired");
        }

        Ok(())
    }
}

/// Error of [`ExpireFreights`] execution.
pub type ExecutionError = Traced<database::Error>;
