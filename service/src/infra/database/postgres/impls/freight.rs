//! [`Freight`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Insert, Select, Update},
    Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        assignment,
        freight::{self, Change, Pricing, Status, Transition},
        Freight,
    },
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
    read,
};

/// Expands to the list of [`Freight`] columns.
macro_rules! columns {
    () => {
        "id, status, producer_id, driver_id, company_id, category, \
         pricing_type, price_rate, price_currency, \
         distance_km, weight_tons, \
         required_trucks, accepted_trucks, occupant_ids, \
         price_floor, price_floor_currency, \
         pickup_date, delivery_date, \
         created_at, updated_at"
    };
}

impl<C> Postgres<C>
where
    C: Connection,
{
    /// Reads a [`Freight`] from the provided [`Row`], rewriting its stored
    /// [`Status`] to the canonical token if it's a legacy spelling.
    ///
    /// Conditional writes compare canonical tokens only, so a legacy row
    /// must be rewritten before any of them targets it.
    async fn read_row(
        &self,
        row: &Row,
    ) -> Result<Freight, Traced<database::Error>> {
        let freight = from_row(row)?;
        let stored: &str = row.get("status");
        if let Some(status) = Status::rewrite_of(stored) {
            const SQL: &str = "UPDATE freights \
                               SET status = $2::VARCHAR \
                               WHERE id = $1::UUID \
                                     AND status = $3::VARCHAR";
            _ = self
                .exec(SQL, &[&freight.id, &status, &stored])
                .await
                .map_err(tracerr::wrap!())?;
        }
        Ok(freight)
    }
}

/// Reads a [`Freight`] from the provided [`Row`].
///
/// # Errors
///
/// If the [`Row`] holds an out of range truck count.
fn from_row(row: &Row) -> Result<Freight, Traced<database::Error>> {
    let trucks = |column: &str| {
        freight::TruckCount::try_from(row.get::<_, i32>(column)).map_err(|_| {
            tracerr::map_from(tracerr::new!(postgres::Error::MalformedRow(
                "freights"
            )))
        })
    };
    let price_floor = row
        .get::<_, Option<Decimal>>("price_floor")
        .zip(row.get::<_, Option<Currency>>("price_floor_currency"))
        .map(|(amount, currency)| Money { amount, currency });

    Ok(Freight {
        id: row.get("id"),
        status: row.get("status"),
        producer_id: row.get("producer_id"),
        driver_id: row.get("driver_id"),
        company_id: row.get("company_id"),
        category: row.get("category"),
        pricing: Pricing::new(
            row.get("pricing_type"),
            Money {
                amount: row.get("price_rate"),
                currency: row.get("price_currency"),
            },
        ),
        distance_km: row.get("distance_km"),
        weight_tons: row.get("weight_tons"),
        required_trucks: trucks("required_trucks")?,
        accepted_trucks: trucks("accepted_trucks")?,
        occupant_ids: row.get("occupant_ids"),
        price_floor,
        pickup_date: row.get("pickup_date"),
        delivery_date: row.get("delivery_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl<C> Database<Select<By<Option<Freight>, freight::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Freight>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Freight>, freight::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: freight::Id = by.into_inner();

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM freights \
              WHERE id = $1::UUID",
        );
        let Some(row) = self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };
        self.read_row(&row)
            .await
            .map(Some)
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Freight>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(freight): Insert<Freight>,
    ) -> Result<Self::Ok, Self::Err> {
        let Freight {
            id,
            status,
            producer_id,
            driver_id,
            company_id,
            category,
            pricing,
            distance_km,
            weight_tons,
            required_trucks,
            accepted_trucks,
            occupant_ids,
            price_floor,
            pickup_date,
            delivery_date,
            created_at,
            updated_at,
        } = freight;
        let rate = pricing.rate();

        const SQL: &str = concat!(
            "INSERT INTO freights (",
            columns!(),
            ") \
             VALUES (\
                 $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::UUID, \
                 $6::INT2, \
                 $7::INT2, $8::NUMERIC, $9::INT2, \
                 $10::NUMERIC, $11::NUMERIC, \
                 $12::INT4, $13::INT4, $14::UUID[], \
                 $15::NUMERIC, $16::INT2, \
                 $17::DATE, $18::DATE, \
                 $19::TIMESTAMPTZ, $20::TIMESTAMPTZ\
             )",
        );
        self.exec(
            SQL,
            &[
                &id,
                &status,
                &producer_id,
                &driver_id,
                &company_id,
                &category,
                &pricing.kind(),
                &rate.amount,
                &rate.currency,
                &distance_km,
                &weight_tons,
                &i32::from(required_trucks),
                &i32::from(accepted_trucks),
                &occupant_ids,
                &price_floor.map(|m| m.amount),
                &price_floor.map(|m| m.currency),
                &pickup_date,
                &delivery_date,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Transition>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Freight>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(transition): Update<Transition>,
    ) -> Result<Self::Ok, Self::Err> {
        let Transition {
            freight_id,
            expected,
            change,
        } = transition;
        let accepted_trucks = expected.accepted_trucks.map(i32::from);
        let now = freight::ModificationDateTime::now();

        let row = match change {
            Change::Status(status) => {
                const SQL: &str = concat!(
                    "UPDATE freights \
                     SET status = $4::VARCHAR, \
                         updated_at = $5::TIMESTAMPTZ \
                     WHERE id = $1::UUID \
                           AND status = ANY($2::VARCHAR[]) \
                           AND ($3::INT4 IS NULL \
                                OR accepted_trucks = $3::INT4) \
                     RETURNING ",
                    columns!(),
                );
                self.query_opt(
                    SQL,
                    &[
                        &freight_id,
                        &expected.statuses,
                        &accepted_trucks,
                        &status,
                        &now,
                    ],
                )
                .await
            }
            Change::Occupy {
                driver_id,
                company_id,
            } => {
                const SQL: &str = concat!(
                    "UPDATE freights \
                     SET accepted_trucks = accepted_trucks + 1, \
                         occupant_ids = array_append(occupant_ids, $4::UUID), \
                         driver_id = CASE WHEN required_trucks = 1 \
                                          THEN $4::UUID \
                                          ELSE driver_id END, \
                         company_id = CASE WHEN required_trucks = 1 \
                                           THEN $5::UUID \
                                           ELSE company_id END, \
                         status = CASE WHEN accepted_trucks + 1 \
                                            >= required_trucks \
                                       THEN $6::VARCHAR \
                                       ELSE status END, \
                         updated_at = $7::TIMESTAMPTZ \
                     WHERE id = $1::UUID \
                           AND status = ANY($2::VARCHAR[]) \
                           AND ($3::INT4 IS NULL \
                                OR accepted_trucks = $3::INT4) \
                           AND accepted_trucks < required_trucks \
                           AND NOT ($4::UUID = ANY(occupant_ids)) \
                     RETURNING ",
                    columns!(),
                );
                self.query_opt(
                    SQL,
                    &[
                        &freight_id,
                        &expected.statuses,
                        &accepted_trucks,
                        &driver_id,
                        &company_id,
                        &Status::Accepted,
                        &now,
                    ],
                )
                .await
            }
            Change::Reset => {
                const SQL: &str = concat!(
                    "UPDATE freights \
                     SET status = $4::VARCHAR, \
                         driver_id = NULL, \
                         company_id = NULL, \
                         accepted_trucks = 0, \
                         occupant_ids = '{}', \
                         updated_at = $5::TIMESTAMPTZ \
                     WHERE id = $1::UUID \
                           AND status = ANY($2::VARCHAR[]) \
                           AND ($3::INT4 IS NULL \
                                OR accepted_trucks = $3::INT4) \
                     RETURNING ",
                    columns!(),
                );
                self.query_opt(
                    SQL,
                    &[
                        &freight_id,
                        &expected.statuses,
                        &accepted_trucks,
                        &Status::Open,
                        &now,
                    ],
                )
                .await
            }
        }
        .map_err(tracerr::wrap!())?;

        row.as_ref()
            .map(from_row)
            .transpose()
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Freight>, read::freight::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
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

        const SQL: &str = concat!(
            "SELECT ",
            columns!(),
            " FROM freights f \
              WHERE ($1::VARCHAR[] IS NULL \
                     OR f.status = ANY($1::VARCHAR[]) \
                     OR f.status <> ALL($6::VARCHAR[])) \
                    AND ($2::UUID IS NULL OR f.producer_id = $2::UUID) \
                    AND ($3::UUID IS NULL \
                         OR f.driver_id = $3::UUID \
                         OR f.company_id = $3::UUID \
                         OR EXISTS (\
                             SELECT 1 FROM assignments a \
                             WHERE a.freight_id = f.id \
                                   AND a.status <> $4::INT2 \
                                   AND (a.driver_id = $3::UUID \
                                        OR a.company_id = $3::UUID)\
                         )) \
                    AND ($5::TIMESTAMPTZ IS NULL \
                         OR f.created_at < $5::TIMESTAMPTZ) \
              ORDER BY f.created_at DESC, f.id DESC",
        );
        let rows = self
            .query(
                SQL,
                &[
                    &statuses,
                    &producer_id,
                    &carrier_id,
                    &assignment::Status::Cancelled,
                    &created_before,
                    &Status::ALL.as_slice(),
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        let mut freights = Vec::with_capacity(rows.len());
        for row in &rows {
            let freight = self.read_row(row).await.map_err(tracerr::wrap!())?;
            // Legacy spellings are matched only once normalized.
            if statuses.as_ref().map_or(true, |s| s.contains(&freight.status))
            {
                freights.push(freight);
            }
        }
        Ok(freights)
    }
}
