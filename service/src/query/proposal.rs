//! [`Query`] collection related to a single [`Proposal`].

use common::operations::By;

use crate::domain::{proposal, Proposal};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Proposal`] by its [`proposal::Id`].
pub type ById = DatabaseQuery<By<Option<Proposal>, proposal::Id>>;
