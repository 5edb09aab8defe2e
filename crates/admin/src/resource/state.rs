//! List state and query parameters for a resource collection.

use serde::{Deserialize, Serialize};

use chimax_core::EntityId;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// In-memory view of one backend collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListState<E> {
    pub items: Vec<E>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub loading: bool,
    pub initial_loading: bool,
    pub error: Option<String>,
    /// Whether any fetch has succeeded yet.
    #[serde(default)]
    pub loaded: bool,
}

/// What a screen should show for the list as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ListPhase {
    /// Nothing loaded yet and a first fetch is pending (or about to be).
    InitialLoading,
    /// The first fetch failed; offer a retry instead of the table.
    InitialFailed(String),
    /// At least one fetch succeeded; errors from here on are toasts.
    Ready,
}

impl<E> Default for ListState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total: 0,
            loading: false,
            initial_loading: false,
            error: None,
            loaded: false,
        }
    }
}

impl<E> ListState<E> {
    #[must_use]
    pub fn phase(&self) -> ListPhase {
        if self.loaded {
            return ListPhase::Ready;
        }
        match &self.error {
            Some(message) if !self.initial_loading => ListPhase::InitialFailed(message.clone()),
            _ => ListPhase::InitialLoading,
        }
    }

    /// Whether more pages exist beyond what is loaded.
    #[must_use]
    pub fn has_more(&self) -> bool {
        (self.items.len() as u64) < self.total
    }
}

/// Filter and pagination parameters for a list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub status: Option<String>,
    /// Inclusive start date, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`.
    pub to: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            from: None,
            to: None,
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Same filters, next page.
    #[must_use]
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }

    /// Backend query-string pairs. Blank filters are left out.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("start", self.page.max(1).to_string()),
            ("limit", self.page_size.max(1).to_string()),
        ];
        let filters = [
            ("status", &self.status),
            ("startDate", &self.from),
            ("endDate", &self.to),
            ("search", &self.search),
        ];
        for (key, value) in filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }
}

/// Position of an item by id.
pub(crate) fn position_of<E: chimax_core::Entity>(items: &[E], id: &EntityId) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_before_and_after_first_load() {
        let mut state: ListState<()> = ListState::default();
        assert_eq!(state.phase(), ListPhase::InitialLoading);

        state.error = Some("Could not reach the server".to_string());
        assert_eq!(
            state.phase(),
            ListPhase::InitialFailed("Could not reach the server".to_string())
        );

        state.loaded = true;
        assert_eq!(state.phase(), ListPhase::Ready);
    }

    #[test]
    fn test_query_pairs_skip_blank_filters() {
        let query = ListQuery {
            status: Some("pending".to_string()),
            search: Some("   ".to_string()),
            from: Some("2024-01-01".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("start", "1".to_string()),
                ("limit", "20".to_string()),
                ("status", "pending".to_string()),
                ("startDate", "2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_next_page_keeps_filters() {
        let query = ListQuery {
            search: Some("mia".to_string()),
            ..ListQuery::default()
        };
        let next = query.next_page();
        assert_eq!(next.page, 2);
        assert_eq!(next.search.as_deref(), Some("mia"));
    }
}
