//! [`Query`] collection related to the multiple [`Freight`]s.

use std::collections::HashSet;

use common::{
    operations::{By, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{
        freight::Status,
        user::{Role, User},
        Freight,
    },
    infra::{database, Database},
    read::{self, freight::Board},
    Query, Service,
};

use super::DatabaseQuery;

/// Queries a list of [`Freight`]s.
pub type List =
    DatabaseQuery<By<Vec<Freight>, read::freight::list::Filter>>;

/// [`Query`] of the [`Freight`]s the provided [`User`] sees, grouped into a
/// [`Board`].
///
/// Producers see their own [`Freight`]s, administrators see everything,
/// while carriers see the [`Freight`]s they are assigned to along with the
/// open market.
#[derive(Clone, Debug)]
pub struct Visible {
    /// [`User`] viewing the [`Freight`]s.
    pub viewer: User,

    /// [`Date`] to classify the [`Freight`]s as of.
    pub today: Date,
}

impl<Db> Query<Visible> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Freight>, read::freight::list::Filter>>,
        Ok = Vec<Freight>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Board;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Visible { viewer, today }: Visible,
    ) -> Result<Self::Ok, Self::Err> {
        use read::freight::list::Filter;

        let list =
            |filter: Filter| self.database().execute(Select(By::new(filter)));

        let freights = match viewer.role {
            Role::Admin => list(Filter::default())
                .await
                .map_err(tracerr::wrap!())?,
            Role::Producer => {
                list(Filter {
                    producer_id: Some(viewer.id),
                    ..Filter::default()
                })
                .await
                .map_err(tracerr::wrap!())?
            }
            Role::Driver | Role::Company => {
                let mut assigned = list(Filter {
                    carrier_id: Some(viewer.id),
                    ..Filter::default()
                })
                .await
                .map_err(tracerr::wrap!())?;
                let market = list(Filter {
                    statuses: Some(Status::BIDDABLE.to_vec()),
                    ..Filter::default()
                })
                .await
                .map_err(tracerr::wrap!())?;

                let seen =
                    assigned.iter().map(|f| f.id).collect::<HashSet<_>>();
                assigned.extend(
                    market
                        .into_iter()
                        .filter(|f| f.is_biddable() && !seen.contains(&f.id)),
                );
                assigned
            }
        };

        Ok(Board::new(freights, today))
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        command::{accept::Offer, Accept},
        domain::{
            freight::{self, Status},
            user::Role,
        },
        spec, Command as _, Query as _,
    };

    use super::Visible;

    #[tokio::test]
    async fn scopes_by_role() {
        let (svc, _events) = spec::service();
        let today = Date::today();
        let producer = spec::user(&svc, Role::Producer, None).await;
        let other = spec::user(&svc, Role::Producer, None).await;
        let company = spec::user(&svc, Role::Company, None).await;
        let driver = spec::user(&svc, Role::Driver, Some(company.id)).await;
        let admin = spec::user(&svc, Role::Admin, None).await;

        let mut own = freight::spec::freight(2);
        own.producer_id = producer.id;
        let mut foreign = freight::spec::freight(1);
        foreign.producer_id = other.id;
        let mut done = freight::spec::freight(1);
        done.producer_id = other.id;
        done.status = Status::Completed;
        for f in [&own, &foreign, &done] {
            spec::freight(&svc, f.clone()).await;
        }

        spec::consent(&svc, &foreign, &driver).await;
        _ = svc
            .execute(Accept {
                freight_id: foreign.id,
                driver_id: driver.id,
                company_id: Some(company.id),
                initiator_id: company.id,
                offer: Offer::ListPrice,
            })
            .await
            .unwrap();

        let board = svc
            .execute(Visible {
                viewer: producer.clone(),
                today,
            })
            .await
            .unwrap();
        assert_eq!(board.open.len(), 1);
        assert_eq!(board.open[0].id, own.id);
        assert!(board.active.is_empty() && board.completed.is_empty());

        for carrier in [&driver, &company] {
            let board = svc
                .execute(Visible {
                    viewer: carrier.clone(),
                    today,
                })
                .await
                .unwrap();
            assert_eq!(board.open.len(), 1, "{}", carrier.role);
            assert_eq!(board.open[0].id, own.id);
            assert_eq!(board.active.len(), 1, "{}", carrier.role);
            assert_eq!(board.active[0].id, foreign.id);
            assert!(board.completed.is_empty());
        }

        let board = svc
            .execute(Visible {
                viewer: admin,
                today,
            })
            .await
            .unwrap();
        assert_eq!(
            board.open.len() + board.active.len() + board.completed.len(),
            3,
        );
    }
}
