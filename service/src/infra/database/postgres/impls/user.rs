//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, role, name, is_approved, company_id, created_at \
            FROM users \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| User {
                id: row.get("id"),
                role: row.get("role"),
                name: row.get("name"),
                is_approved: row.get("is_approved"),
                company_id: row.get("company_id"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            role,
            name,
            is_approved,
            company_id,
            created_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, role, name, is_approved, company_id, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::INT2, $3::VARCHAR, $4::BOOL, $5::UUID, \
                $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET role = EXCLUDED.role, \
                name = EXCLUDED.name, \
                is_approved = EXCLUDED.is_approved, \
                company_id = EXCLUDED.company_id";
        self.exec(
            SQL,
            &[&id, &role, &name, &is_approved, &company_id, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
