//! Read entities definitions.

pub mod freight;
