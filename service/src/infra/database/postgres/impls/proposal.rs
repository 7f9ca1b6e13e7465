//! [`Proposal`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{freight, proposal, Proposal},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Reads a [`Proposal`] from the provided [`Row`].
fn from_row(row: &Row) -> Proposal {
    Proposal {
        id: row.get("id"),
        freight_id: row.get("freight_id"),
        driver_id: row.get("driver_id"),
        company_id: row.get("company_id"),
        status: row.get("status"),
        proposed_price: Money {
            amount: row.get("proposed_price"),
            currency: row.get("proposed_price_currency"),
        },
        message: row.get("message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Proposal>, proposal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Proposal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Proposal>, proposal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: proposal::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, freight_id, driver_id, company_id, status, \
                   proposed_price, proposed_price_currency, message, \
                   created_at, updated_at \
            FROM proposals \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Proposal>, freight::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Proposal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Proposal>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let freight_id: freight::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, freight_id, driver_id, company_id, status, \
                   proposed_price, proposed_price_currency, message, \
                   created_at, updated_at \
            FROM proposals \
            WHERE freight_id = $1::UUID \
            ORDER BY created_at ASC";
        Ok(self
            .query(SQL, &[&freight_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Proposal>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Proposal>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(proposal): Insert<Proposal>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(proposal))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Proposal>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(proposal): Update<Proposal>,
    ) -> Result<Self::Ok, Self::Err> {
        let Proposal {
            id,
            freight_id,
            driver_id,
            company_id,
            status,
            proposed_price,
            message,
            created_at,
            updated_at,
        } = proposal;

        // One proposal per driver and freight.
        const SQL: &str = "\
            INSERT INTO proposals (\
                id, freight_id, driver_id, company_id, status, \
                proposed_price, proposed_price_currency, message, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::INT2, \
                $6::NUMERIC, $7::INT2, $8::VARCHAR, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (freight_id, driver_id) DO UPDATE \
            SET company_id = EXCLUDED.company_id, \
                status = EXCLUDED.status, \
                proposed_price = EXCLUDED.proposed_price, \
                proposed_price_currency = EXCLUDED.proposed_price_currency, \
                message = EXCLUDED.message, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &freight_id,
                &driver_id,
                &company_id,
                &status,
                &proposed_price.amount,
                &proposed_price.currency,
                &message,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<proposal::Decision>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Proposal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(decision): Update<proposal::Decision>,
    ) -> Result<Self::Ok, Self::Err> {
        let proposal::Decision {
            proposal_id,
            status,
        } = decision;

        const SQL: &str = "\
            UPDATE proposals \
            SET status = $2::INT2, \
                updated_at = $3::TIMESTAMPTZ \
            WHERE id = $1::UUID \
                  AND status = $4::INT2 \
            RETURNING id, freight_id, driver_id, company_id, status, \
                      proposed_price, proposed_price_currency, message, \
                      created_at, updated_at";
        Ok(self
            .query_opt(
                SQL,
                &[
                    &proposal_id,
                    &status,
                    &proposal::ModificationDateTime::now(),
                    &proposal::Status::Pending,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}
