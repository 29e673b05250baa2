//! Query errors and result structures

use super::tier::{ScoringMode, Tier};
use serde::Serialize;
use thiserror::Error;

/// Invalid query input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Search term is empty")]
    EmptySearchTerm,

    #[error("Unknown scoring mode '{0}' (expected v3 or v4)")]
    UnknownMode(String),

    #[error("Unknown confidence tier '{0}' (expected High, Medium, Low or AF2)")]
    UnknownTier(String),

    #[error("Tier '{tier}' is not available in {mode} mode")]
    TierNotAvailable { tier: String, mode: ScoringMode },
}

/// A row with the tier it was classified into under the query's mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub item: T,
    pub tier: Option<Tier>,
}

/// Result of an interaction query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<T> {
    /// Rows passing the filter, in ranking order
    pub items: Vec<Ranked<T>>,
    /// Rows considered before filtering
    pub total_count: usize,
}

impl<T> QueryResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
