//! View filter: read-only projections of a snapshot for presentation.
//!
//! Nothing here mutates the snapshot. Projections borrow rows and keep the
//! snapshot's server-provided order.

use crate::snapshot::{DerivedStatus, MonitorSnapshot, MonitoredEndpoint};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Facet value that disables a filter.
pub const ALL: &str = "All";

/// Selection on a label facet (category, sport).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FacetFilter {
    #[default]
    All,
    /// Exact, case-sensitive match against the row's label
    Exact(String),
}

pub type CategoryFilter = FacetFilter;
pub type SportFilter = FacetFilter;

impl FacetFilter {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            FacetFilter::All => true,
            FacetFilter::Exact(wanted) => label == wanted,
        }
    }
}

impl FromStr for FacetFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("filter value cannot be empty".to_string());
        }
        if s.eq_ignore_ascii_case(ALL) {
            Ok(FacetFilter::All)
        } else {
            Ok(FacetFilter::Exact(s.to_string()))
        }
    }
}

impl fmt::Display for FacetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetFilter::All => write!(f, "{}", ALL),
            FacetFilter::Exact(label) => write!(f, "{}", label),
        }
    }
}

/// Health facet selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Responding: `online` or `slow`
    Online,
    /// Not responding: `offline` or `unknown`. Also accepted as `failed`.
    Offline,
}

impl StatusFilter {
    pub fn matches(self, status: DerivedStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Online => status.is_responding(),
            StatusFilter::Offline => !status.is_responding(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "online" => Ok(StatusFilter::Online),
            "offline" | "failed" => Ok(StatusFilter::Offline),
            _ => Err(format!(
                "Unknown status filter: {} (expected all, online, offline or failed)",
                s
            )),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "All"),
            StatusFilter::Online => write!(f, "Online"),
            StatusFilter::Offline => write!(f, "Offline"),
        }
    }
}

/// Rows matching both facets, in snapshot order.
pub fn project<'a>(
    snapshot: &'a MonitorSnapshot,
    category: &CategoryFilter,
    status: StatusFilter,
) -> Vec<&'a MonitoredEndpoint> {
    snapshot
        .endpoints
        .iter()
        .filter(|endpoint| {
            category.matches(endpoint.category_label()) && status.matches(endpoint.derived_status)
        })
        .collect()
}

/// Distinct labels in first-appearance order, prefixed with [`ALL`].
pub fn facet<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = vec![ALL.to_string()];
    for label in labels {
        if seen.insert(label) {
            values.push(label.to_string());
        }
    }
    values
}

/// Category universe of a snapshot, for populating the category facet.
pub fn categories(snapshot: &MonitorSnapshot) -> Vec<String> {
    facet(snapshot.endpoints.iter().map(MonitoredEndpoint::category_label))
}

/// One page of `items` (1-based) and the page count. Out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> (&[T], usize) {
    let per_page = per_page.max(1);
    let pages = items.len().div_ceil(per_page).max(1);
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if page == 0 || start >= items.len() {
        return (&[], pages);
    }
    let end = (start + per_page).min(items.len());
    (&items[start..end], pages)
}

/// Per-status row counts computed from the rows themselves.
///
/// Unlike the server summary these are never stale after a test-now patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub online: usize,
    pub slow: usize,
    pub offline: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a MonitoredEndpoint>) -> Self {
        rows.into_iter()
            .fold(Self::default(), |mut counts, endpoint| {
                match endpoint.derived_status {
                    DerivedStatus::Online => counts.online += 1,
                    DerivedStatus::Slow => counts.slow += 1,
                    DerivedStatus::Offline => counts.offline += 1,
                    DerivedStatus::Unknown => counts.unknown += 1,
                }
                counts
            })
    }

    pub fn total(&self) -> usize {
        self.online + self.slow + self.offline + self.unknown
    }

    pub fn responding(&self) -> usize {
        self.online + self.slow
    }
}
