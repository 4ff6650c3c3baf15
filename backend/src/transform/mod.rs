//! Normalization module.
//!
//! This module turns cached raw collections into response views:
//! - Join: artists with their metadata, and the flat chronological event list
//! - Unify: provider-agnostic artist records and cross-provider de-duplication

pub mod join;
pub mod unify;

pub use join::{build_events, merge_artists};
pub use unify::{from_primary, from_secondary, merge_unified, name_key};
