//! Filter criteria and list queries

use serde::{Deserialize, Serialize};

use super::task::Priority;
use crate::QueryParams;

/// Completion status constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Completed,
    Pending,
}

impl StatusFilter {
    /// Value of the backend's `completed` parameter
    pub fn completed(self) -> bool {
        matches!(self, StatusFilter::Completed)
    }
}

/// Due date window constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    Today,
    Week,
    Month,
    Overdue,
}

impl DateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Week => "week",
            DateFilter::Month => "month",
            DateFilter::Overdue => "overdue",
        }
    }
}

/// Constraints applied to a collection listing
///
/// An absent field means "no constraint". Equal criteria always render the
/// same parameter set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub search_term: Option<String>,
    pub status: Option<StatusFilter>,
    pub priority: Option<Priority>,
    pub date: Option<DateFilter>,
    pub list_id: Option<u64>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text search; blank input clears it
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.set_search(term);
        self
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        let trimmed = term.trim();
        self.search_term = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn date(mut self, date: DateFilter) -> Self {
        self.date = Some(date);
        self
    }

    pub fn list(mut self, list_id: u64) -> Self {
        self.list_id = Some(list_id);
        self
    }

    /// True when no field constrains the listing
    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }

    /// Backend parameters for the present fields
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .with_opt("search", self.search_term.clone())
            .with_opt("completed", self.status.map(StatusFilter::completed))
            .with_opt("priority", self.priority.map(Priority::level))
            .with_opt("dateFilter", self.date.map(DateFilter::as_str))
            .with_opt("taskListId", self.list_id)
    }
}

/// One page of a filtered collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u64,
    pub size: u64,
    pub filter: FilterCriteria,
}

impl ListQuery {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
            filter: FilterCriteria::default(),
        }
    }

    pub fn with_filter(mut self, filter: FilterCriteria) -> Self {
        self.filter = filter;
        self
    }

    /// Backend parameters; the backend indexes pages from zero
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new()
            .with("page", self.page - 1)
            .with("size", self.size);
        params.extend(self.filter.to_params());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_empty_criteria_has_no_params() {
        assert!(FilterCriteria::new().to_params().is_empty());
        assert!(FilterCriteria::new().is_empty());
    }

    #[test]
    fn test_params_for_present_fields() {
        let params = FilterCriteria::new()
            .search("milk")
            .status(StatusFilter::Pending)
            .priority(Priority::High)
            .list(3)
            .to_params();

        assert_eq!(params.get("search"), Some(&Value::from("milk")));
        assert_eq!(params.get("completed"), Some(&Value::from(false)));
        assert_eq!(params.get("priority"), Some(&Value::from(1)));
        assert_eq!(params.get("taskListId"), Some(&Value::from(3)));
        assert!(params.get("dateFilter").is_none());
    }

    #[test]
    fn test_blank_search_is_no_constraint() {
        assert_eq!(FilterCriteria::new().search("   "), FilterCriteria::new());
        assert_eq!(
            FilterCriteria::new().search("  milk "),
            FilterCriteria::new().search("milk")
        );
    }

    #[test]
    fn test_list_query_uses_zero_based_page() {
        let params = ListQuery::new(3, 20).to_params();
        assert_eq!(params.get("page"), Some(&Value::from(2)));
        assert_eq!(params.get("size"), Some(&Value::from(20)));
    }

    #[test]
    fn test_list_query_clamps_to_first_page() {
        assert_eq!(ListQuery::new(0, 0).page, 1);
        assert_eq!(ListQuery::new(0, 0).size, 1);
    }
}
