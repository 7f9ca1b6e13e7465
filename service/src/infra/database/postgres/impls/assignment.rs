//! [`Assignment`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{freight, Assignment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Vec<Assignment>, freight::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Assignment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Assignment>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let freight_id: freight::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, freight_id, driver_id, company_id, status, \
                   agreed_price, agreed_price_currency, \
                   created_at, updated_at \
            FROM assignments \
            WHERE freight_id = $1::UUID \
            ORDER BY created_at ASC";
        Ok(self
            .query(SQL, &[&freight_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Assignment {
                id: row.get("id"),
                freight_id: row.get("freight_id"),
                driver_id: row.get("driver_id"),
                company_id: row.get("company_id"),
                status: row.get("status"),
                agreed_price: Money {
                    amount: row.get("agreed_price"),
                    currency: row.get("agreed_price_currency"),
                },
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }
}

impl<C> Database<Insert<Assignment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Assignment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(assignment): Insert<Assignment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(assignment))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Assignment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(assignment): Update<Assignment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Assignment {
            id,
            freight_id,
            driver_id,
            company_id,
            status,
            agreed_price,
            created_at,
            updated_at,
        } = assignment;

        const SQL: &str = "\
            INSERT INTO assignments (\
                id, freight_id, driver_id, company_id, status, \
                agreed_price, agreed_price_currency, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::INT2, \
                $6::NUMERIC, $7::INT2, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                agreed_price = EXCLUDED.agreed_price, \
                agreed_price_currency = EXCLUDED.agreed_price_currency, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &freight_id,
                &driver_id,
                &company_id,
                &status,
                &agreed_price.amount,
                &agreed_price.currency,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
