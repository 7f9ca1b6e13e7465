//! [`StatusHistoryEntry`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{freight, status_history::Location, StatusHistoryEntry},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<StatusHistoryEntry>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<StatusHistoryEntry>,
    ) -> Result<Self::Ok, Self::Err> {
        let StatusHistoryEntry {
            id,
            freight_id,
            status,
            changed_by,
            notes,
            location,
            created_at,
        } = entry;

        const SQL: &str = "\
            INSERT INTO freight_status_history (\
                id, freight_id, status, changed_by, notes, \
                latitude, longitude, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::UUID, $5::VARCHAR, \
                $6::FLOAT8, $7::FLOAT8, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &freight_id,
                &status,
                &changed_by,
                &notes,
                &location.map(|l| l.latitude),
                &location.map(|l| l.longitude),
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<StatusHistoryEntry>, freight::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<StatusHistoryEntry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<StatusHistoryEntry>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let freight_id: freight::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, freight_id, status, changed_by, notes, \
                   latitude, longitude, created_at \
            FROM freight_status_history \
            WHERE freight_id = $1::UUID \
            ORDER BY created_at ASC";
        Ok(self
            .query(SQL, &[&freight_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| StatusHistoryEntry {
                id: row.get("id"),
                freight_id: row.get("freight_id"),
                status: row.get("status"),
                changed_by: row.get("changed_by"),
                notes: row.get("notes"),
                location: row
                    .get::<_, Option<f64>>("latitude")
                    .zip(row.get::<_, Option<f64>>("longitude"))
                    .and_then(|(lat, lon)| Location::new(lat, lon)),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
