//! Query parameters shared by pfSense v2 list endpoints.
//!
//! List endpoints page their results; `limit=0` asks for every object.

use std::fmt;

/// Sort direction accepted by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// `SORT_ASC`
    Ascending,
    /// `SORT_DESC`
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascending => "SORT_ASC",
            Self::Descending => "SORT_DESC",
        })
    }
}

/// Paging and sorting for a list request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum number of objects; `0` disables the cap.
    pub limit: Option<u32>,
    /// Number of objects to skip.
    pub offset: Option<u32>,
    /// Field to sort by.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_order: Option<SortOrder>,
}

impl ListQuery {
    /// Query returning every object in one response.
    #[must_use]
    pub fn all() -> Self {
        Self {
            limit: Some(0),
            ..Self::default()
        }
    }

    /// Sort by a field.
    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    /// Convert to URL query pairs, skipping unset fields.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(field) = &self.sort_by {
            pairs.push(("sort_by", field.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sort_order", order.to_string()));
        }
        pairs
    }
}
