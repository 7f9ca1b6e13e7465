//! [`TrackingConsent`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{freight, user, TrackingConsent},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<TrackingConsent>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(consent): Insert<TrackingConsent>,
    ) -> Result<Self::Ok, Self::Err> {
        let TrackingConsent {
            freight_id,
            driver_id,
            granted_at,
        } = consent;

        const SQL: &str = "\
            INSERT INTO tracking_consents (freight_id, driver_id, granted_at) \
            VALUES ($1::UUID, $2::UUID, $3::TIMESTAMPTZ) \
            ON CONFLICT (freight_id, driver_id) DO NOTHING";
        self.exec(SQL, &[&freight_id, &driver_id, &granted_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<TrackingConsent>, (freight::Id, user::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<TrackingConsent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<TrackingConsent>, (freight::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (freight_id, driver_id) = by.into_inner();

        const SQL: &str = "\
            SELECT freight_id, driver_id, granted_at \
            FROM tracking_consents \
            WHERE freight_id = $1::UUID AND driver_id = $2::UUID";
        Ok(self
            .query_opt(SQL, &[&freight_id, &driver_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| TrackingConsent {
                freight_id: row.get("freight_id"),
                driver_id: row.get("driver_id"),
                granted_at: row.get("granted_at"),
            }))
    }
}
