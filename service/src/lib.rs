//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error;

use common::operations::{By, Start};
use derive_more::Debug;

#[cfg(doc)]
use infra::Database;
use infra::{outbox, Outbox};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key of the bearer tokens issued by the identity
    /// provider.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`task::ExpireFreights`] configuration.
    pub expire_freights: task::expire_freights::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Outbox`] of the events fired by this [`Service`].
    outbox: Outbox,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ExpireFreights<Self>,
                        task::expire_freights::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<By<task::DispatchOutbox<Self>, outbox::Receiver>>,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let (this, events) = Self::detached(config, database);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().expire_freights)))
                .await
        });
        let svc = this.clone();
        bg.spawn(async move { svc.execute(Start(By::new(events))).await });

        (this, bg)
    }

    /// Creates a new [`Service`] without spawning its background
    /// [`Task`]s, returning the [`outbox::Receiver`] of its events.
    pub fn detached(config: Config, database: Db) -> (Self, outbox::Receiver) {
        let (outbox, events) = Outbox::new();
        (
            Self {
                config,
                database,
                outbox,
            },
            events,
        )
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Outbox`] of this [`Service`].
    #[must_use]
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }
}

#[cfg(test)]
pub(crate) mod spec {
    //! Test fixtures.

    use std::time;

    use common::operations::{By, Insert, Select};

    use crate::{
        domain::{
            freight, tracking_consent, user, Freight, TrackingConsent, User,
        },
        infra::{outbox, Database as _, Memory},
        task, Config, Service,
    };

    /// JWT secret the test [`Service`] accepts.
    pub(crate) const JWT_SECRET: &[u8] = b"test-secret";

    /// Creates a new [`Service`] over an empty [`Memory`] database.
    pub(crate) fn service() -> (Service<Memory>, outbox::Receiver) {
        Service::detached(
            Config {
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    JWT_SECRET,
                ),
                expire_freights: task::expire_freights::Config {
                    interval: time::Duration::from_secs(60),
                },
            },
            Memory::new(),
        )
    }

    /// Stores a new approved [`User`] with the provided [`user::Role`].
    pub(crate) async fn user(
        svc: &Service<Memory>,
        role: user::Role,
        company_id: Option<user::Id>,
    ) -> User {
        let user = User {
            id: user::Id::new(),
            role,
            name: user::Name::new("Someone").unwrap(),
            is_approved: true,
            company_id,
            created_at: user::CreationDateTime::now(),
        };
        svc.database().execute(Insert(user.clone())).await.unwrap();
        user
    }

    /// Stores the provided [`Freight`].
    pub(crate) async fn freight(svc: &Service<Memory>, freight: Freight) {
        svc.database().execute(Insert(freight)).await.unwrap();
    }

    /// Loads the stored state of the [`Freight`] with the provided ID.
    pub(crate) async fn stored(
        svc: &Service<Memory>,
        id: freight::Id,
    ) -> Freight {
        svc.database()
            .execute(Select(By::<Option<Freight>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }

    /// Stores a [`TrackingConsent`] of the provided driver.
    pub(crate) async fn consent(
        svc: &Service<Memory>,
        freight: &Freight,
        driver: &User,
    ) {
        svc.database()
            .execute(Insert(TrackingConsent {
                freight_id: freight.id,
                driver_id: driver.id,
                granted_at: tracking_consent::GrantDateTime::now(),
            }))
            .await
            .unwrap();
    }
}
