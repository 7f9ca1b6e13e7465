//! [`Command`] for authorizing a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by the bearer token issued by the
/// identity provider.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUser {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUser> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AuthorizeUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUser { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        self.database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`AuthorizeUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        domain::user::{self, session, Role, Session},
        spec, Command as _,
    };

    use super::{AuthorizeUser, ExecutionError};

    fn token(user_id: user::Id, ttl: Duration) -> session::Token {
        let session = Session {
            user_id,
            expires_at: session::ExpirationDateTime::now() + ttl,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &session,
            &EncodingKey::from_secret(spec::JWT_SECRET),
        )
        .unwrap()
        .parse()
        .unwrap()
    }

    #[tokio::test]
    async fn resolves_token_owner() {
        let (svc, _events) = spec::service();
        let producer = spec::user(&svc, Role::Producer, None).await;

        let user = svc
            .execute(AuthorizeUser {
                token: token(producer.id, Duration::from_secs(3600)),
            })
            .await
            .unwrap();
        assert_eq!(user.id, producer.id);
        assert_eq!(user.role, Role::Producer);
    }

    #[tokio::test]
    async fn refuses_unknown_user_and_garbage() {
        let (svc, _events) = spec::service();

        let err = svc
            .execute(AuthorizeUser {
                token: token(user::Id::new(), Duration::from_secs(3600)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));

        let err = svc
            .execute(AuthorizeUser {
                token: "not.a.token".parse().unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }
}
