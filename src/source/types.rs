//! Page request/result types and record views.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::CAPPED_TOTAL_COUNT;

/// Sort direction as emitted by the table widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortDirection {
    /// Value of the `order` query parameter, if any.
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            SortDirection::Ascending => Some("asc"),
            SortDirection::Descending => Some("desc"),
            SortDirection::None => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query().unwrap_or(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sort direction '{0}', expected asc, desc or none")]
pub struct ParseSortDirectionError(String);

impl FromStr for SortDirection {
    type Err = ParseSortDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            "" | "none" => Ok(SortDirection::None),
            other => Err(ParseSortDirectionError(other.to_string())),
        }
    }
}

/// One page of one sort order. Built fresh for every logical fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PageRequest {
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub page_index: u32,
}

impl PageRequest {
    pub fn new(
        sort_field: impl Into<String>,
        sort_direction: SortDirection,
        page_index: u32,
    ) -> Self {
        Self {
            sort_field: sort_field.into(),
            sort_direction,
            page_index,
        }
    }

    /// Unsorted request for `page_index`.
    pub fn page(page_index: u32) -> Self {
        Self {
            page_index,
            ..Self::default()
        }
    }

    pub fn is_sorted(&self) -> bool {
        !self.sort_field.is_empty() && self.sort_direction != SortDirection::None
    }
}

/// A row as returned by the API. The schema belongs to the remote service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Interpret the row as one of the typed views.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Row of the activity ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRank {
    pub activity: String,
    pub amount: f64,
    pub percentage: f64,
}

/// Row of the contracted suppliers list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

/// Wire shape of a page response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ApiPage {
    #[serde(default)]
    pub items: Vec<Record>,
    #[serde(default)]
    pub total_count: Option<u64>,
    /// Only sent by some endpoints; not interpreted.
    #[serde(default)]
    pub status: Option<String>,
}

/// Total number of rows across all pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalCount {
    Exact(u64),
    /// The API cannot count; stands for [`CAPPED_TOTAL_COUNT`].
    Capped,
}

impl TotalCount {
    pub fn value(&self) -> u64 {
        match self {
            TotalCount::Exact(n) => *n,
            TotalCount::Capped => CAPPED_TOTAL_COUNT,
        }
    }

    pub fn is_capped(&self) -> bool {
        matches!(self, TotalCount::Capped)
    }
}

/// Outcome of one logical fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub items: Vec<Record>,
    pub total_count: TotalCount,
    pub succeeded: bool,
    pub rate_limited: bool,
}

impl PageResult {
    pub fn success(items: Vec<Record>, total_count: TotalCount) -> Self {
        Self {
            items,
            total_count,
            succeeded: true,
            rate_limited: false,
        }
    }

    /// The result shown when data could not be loaded. Never carries rows.
    pub fn unavailable() -> Self {
        Self {
            items: Vec::new(),
            total_count: TotalCount::Exact(0),
            succeeded: false,
            rate_limited: true,
        }
    }
}
