//! Background [`Task`]s definitions.

mod background;
pub mod dispatch_outbox;
pub mod expire_freights;

pub use common::Handler as Task;

pub use self::{
    background::Background, dispatch_outbox::DispatchOutbox,
    expire_freights::ExpireFreights,
};
