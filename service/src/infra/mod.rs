//! Infrastructure layer.

pub mod database;
pub mod outbox;

pub use self::{
    database::{Database, Memory},
    outbox::Outbox,
};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
