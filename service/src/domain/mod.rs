//! Domain definitions.

pub mod assignment;
pub mod freight;
pub mod proposal;
pub mod status_history;
pub mod tracking_consent;
pub mod user;

pub use self::{
    assignment::Assignment, freight::Freight, proposal::Proposal,
    status_history::StatusHistoryEntry, tracking_consent::TrackingConsent,
    user::User,
};
