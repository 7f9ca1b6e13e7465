//! GraphQL API definitions.

pub mod assignment;
pub mod freight;
pub mod history;
mod mutation;
pub mod proposal;
mod query;
pub mod scalar;
pub mod user;

use juniper::EmptySubscription;
use service::domain::freight::{pricing, Ineligibility};

use crate::{define_error, AsError, Context, Error};

pub use self::{
    assignment::Assignment, freight::Freight, history::StatusHistoryEntry,
    mutation::Mutation, proposal::Proposal, query::Query, user::User,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum FreightError {
        #[code = "FREIGHT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Freight` with the specified ID does not exist"]
        NotExists,

        #[code = "CONFLICT"]
        #[status = CONFLICT]
        #[message = "`Freight` was changed concurrently, retry with its \
                     current state"]
        Conflict,

        #[code = "INVALID_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`Freight` cannot move into the requested status"]
        InvalidTransition,

        #[code = "FINAL_STATE_LOCKED"]
        #[status = CONFLICT]
        #[message = "`Freight` reached a terminal status"]
        FinalStateLocked,

        #[code = "INVALID_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Price is invalid for the `Freight`"]
        InvalidPrice,
    }
}

define_error! {
    enum PrivilegeError {
        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` role is not allowed to perform \
                     this action"]
        Forbidden,

        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is not a party of the `Freight`"]
        NotOwner,

        #[code = "NOT_ELIGIBLE"]
        #[status = FORBIDDEN]
        #[message = "Driver is not eligible to take the `Freight`"]
        NotEligible,
    }
}

define_error! {
    enum ProposalError {
        #[code = "PROPOSAL_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Proposal` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}

impl AsError for pricing::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::from(FreightError::InvalidPrice).explained(self))
    }
}

impl AsError for Ineligibility {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::from(PrivilegeError::NotEligible).explained(self))
    }
}
