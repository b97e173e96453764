// src/common/pagination.rs

use serde::{Deserialize, Serialize};

use crate::common::db_utils::like_pattern;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Parâmetros de listagem comuns (?search=&page=&perPage=)
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }

    /// Padrão ILIKE já escapado, ou None se a busca estiver vazia.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, query: &ListQuery) -> Self {
        Self {
            items,
            total,
            page: query.page(),
            per_page: query.per_page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_missing() {
        let q = ListQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.search_pattern(), None);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let q = ListQuery { search: None, page: Some(-3), per_page: Some(10_000) };
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), MAX_PER_PAGE);

        let q = ListQuery { search: None, page: Some(3), per_page: Some(0) };
        assert_eq!(q.per_page(), 1);
        assert_eq!(q.offset(), 2);
    }

    #[test]
    fn offset_follows_page() {
        let q = ListQuery { search: None, page: Some(4), per_page: Some(25) };
        assert_eq!(q.offset(), 75);
    }

    #[test]
    fn blank_search_is_ignored() {
        let q = ListQuery { search: Some("   ".into()), page: None, per_page: None };
        assert_eq!(q.search_pattern(), None);

        let q = ListQuery { search: Some(" caneta ".into()), page: None, per_page: None };
        assert_eq!(q.search_pattern().as_deref(), Some("%caneta%"));
    }
}
