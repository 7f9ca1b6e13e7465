//! [`Query`] collection related to a single [`Freight`].

use common::operations::By;

use crate::domain::{
    freight, Assignment, Freight, Proposal, StatusHistoryEntry,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Freight`] by its [`freight::Id`].
pub type ById = DatabaseQuery<By<Option<Freight>, freight::Id>>;

/// Queries [`Assignment`]s of a [`Freight`].
pub type Assignments = DatabaseQuery<By<Vec<Assignment>, freight::Id>>;

/// Queries [`Proposal`]s of a [`Freight`].
pub type Proposals = DatabaseQuery<By<Vec<Proposal>, freight::Id>>;

/// Queries [`StatusHistoryEntry`]s of a [`Freight`], the oldest first.
pub type History = DatabaseQuery<By<Vec<StatusHistoryEntry>, freight::Id>>;
