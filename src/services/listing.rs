use serde::Deserialize;
use tracing::debug;

use crate::models::appraisal::AppraisalResult;
use crate::models::common::Page;
use crate::models::compensation::{AllowanceDeduction, EmployeeCompensation};
use crate::models::directory::{Company, Department, Employee};
use crate::models::kpi::{CreatorRole, KpiAssignment, KpiTask, WeightTemplate};
use crate::models::notification::Notification;
use crate::models::review::PerformanceReview;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

/// Search, sort and page parameters for lists held in memory after a fetch.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: Some(1),
            page_size: Some(DEFAULT_PAGE_SIZE),
            sort_by: None,
            sort_order: None,
        }
    }
}

/// Entities that can be searched and sorted on a list page.
pub trait Listable {
    fn list_id(&self) -> i64;

    fn list_label(&self) -> &str;

    /// Visible text the search box matches against.
    fn search_fields(&self) -> Vec<&str>;
}

pub fn filter_and_paginate<T>(records: Vec<T>, query: ListQuery, default_page_size: usize) -> Page<T>
where
    T: Listable + Clone,
{
    let search = query
        .search
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    let mut filtered: Vec<T> = records
        .into_iter()
        .filter(|record| matches_search(record, search.as_deref()))
        .collect();

    sort_records(
        &mut filtered,
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
    );

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(default_page_size)
        .clamp(1, MAX_PAGE_SIZE);

    let total = filtered.len();
    let start = (page - 1).saturating_mul(page_size);
    let items = if start >= total {
        Vec::new()
    } else {
        let end = start.saturating_add(page_size).min(total);
        filtered[start..end].to_vec()
    };

    debug!(
        target: "app::listing",
        total,
        page,
        page_size,
        returned = items.len(),
        "list paginated"
    );

    Page::new(items, total, page, page_size)
}

fn matches_search<T: Listable>(record: &T, search: Option<&str>) -> bool {
    let Some(needle) = search else {
        return true;
    };
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn sort_records<T: Listable>(records: &mut [T], sort_by: Option<&str>, sort_order: Option<&str>) {
    let descending = matches!(sort_order, Some(order) if order.eq_ignore_ascii_case("desc"));
    let by_label = matches!(sort_by, Some("name") | Some("title") | Some("label"));
    if sort_by.is_none() {
        return;
    }

    records.sort_by(|left, right| {
        let ordering = if by_label {
            left.list_label()
                .to_lowercase()
                .cmp(&right.list_label().to_lowercase())
                .then_with(|| left.list_id().cmp(&right.list_id()))
        } else {
            left.list_id().cmp(&right.list_id())
        };
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn with_optional<'a>(mut fields: Vec<&'a str>, optional: &[&'a Option<String>]) -> Vec<&'a str> {
    fields.extend(optional.iter().filter_map(|value| value.as_deref()));
    fields
}

impl Listable for KpiTask {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.title
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(vec![self.title.as_str()], &[&self.description, &self.status])
    }
}

impl Listable for CreatorRole {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(vec![self.name.as_str()], &[&self.description])
    }
}

impl Listable for WeightTemplate {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.criteria.iter().map(|criterion| criterion.title.as_str()));
        fields
    }
}

impl Listable for KpiAssignment {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        self.kpi_task_title.as_deref().unwrap_or(&self.month)
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(vec![self.month.as_str()], &[&self.kpi_task_title, &self.status])
    }
}

impl Listable for PerformanceReview {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.employee_name
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(vec![self.employee_name.as_str()], &[&self.reviewer_name, &self.status])
    }
}

impl Listable for AppraisalResult {
    fn list_id(&self) -> i64 {
        self.employee_id
    }

    fn list_label(&self) -> &str {
        &self.employee_name
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(
            vec![
                self.employee_name.as_str(),
                self.grade.as_str(),
                self.performance_label.as_str(),
            ],
            &[&self.attendance_no],
        )
    }
}

impl Listable for Employee {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(vec![self.name.as_str()], &[&self.attendance_no, &self.designation])
    }
}

impl Listable for Company {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Listable for Department {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Listable for EmployeeCompensation {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        self.employee_name.as_deref().unwrap_or_default()
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(Vec::new(), &[&self.employee_name])
    }
}

impl Listable for AllowanceDeduction {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Listable for Notification {
    fn list_id(&self) -> i64 {
        self.id
    }

    fn list_label(&self) -> &str {
        &self.title
    }

    fn search_fields(&self) -> Vec<&str> {
        with_optional(vec![self.title.as_str()], &[&self.message])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: i64, name: &str) -> Company {
        Company {
            id,
            name: name.to_string(),
        }
    }

    fn companies() -> Vec<Company> {
        vec![
            company(3, "Delta Textiles"),
            company(1, "Acme Foods"),
            company(2, "Bengal Steel"),
            company(4, "Acme Logistics"),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let page = filter_and_paginate(
            companies(),
            ListQuery {
                search: Some("  ACME ".to_string()),
                ..Default::default()
            },
            DEFAULT_PAGE_SIZE,
        );
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|item| item.name.starts_with("Acme")));
    }

    #[test]
    fn page_and_size_are_clamped() {
        let page = filter_and_paginate(
            companies(),
            ListQuery {
                page: Some(0),
                page_size: Some(0),
                sort_by: Some("id".to_string()),
                ..Default::default()
            },
            DEFAULT_PAGE_SIZE,
        );
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.last_page, 4);
        assert_eq!(page.items[0].id, 1);

        let oversized = filter_and_paginate(
            companies(),
            ListQuery {
                page_size: Some(10_000),
                ..Default::default()
            },
            DEFAULT_PAGE_SIZE,
        );
        assert_eq!(oversized.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = filter_and_paginate(
            companies(),
            ListQuery {
                page: Some(3),
                page_size: Some(2),
                ..Default::default()
            },
            DEFAULT_PAGE_SIZE,
        );
        assert!(page.items.is_empty());
        assert_eq!(page.total, 4);
        assert_eq!(page.last_page, 2);
    }

    #[test]
    fn huge_page_number_yields_empty_page() {
        for page_number in [usize::MAX / 4, usize::MAX] {
            let page = filter_and_paginate(
                companies(),
                ListQuery {
                    page: Some(page_number),
                    page_size: Some(MAX_PAGE_SIZE),
                    ..Default::default()
                },
                DEFAULT_PAGE_SIZE,
            );
            assert!(page.items.is_empty());
            assert_eq!(page.total, 4);
            assert_eq!(page.page, page_number);
        }

        let empty = filter_and_paginate(
            Vec::<CreatorRole>::new(),
            ListQuery {
                page: Some(usize::MAX / 4),
                ..Default::default()
            },
            DEFAULT_PAGE_SIZE,
        );
        assert!(empty.items.is_empty());
        assert_eq!(empty.last_page, 1);
    }

    #[test]
    fn sorts_by_label_descending() {
        let page = filter_and_paginate(
            companies(),
            ListQuery {
                sort_by: Some("name".to_string()),
                sort_order: Some("DESC".to_string()),
                ..Default::default()
            },
            DEFAULT_PAGE_SIZE,
        );
        let ids: Vec<i64> = page.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn default_page_size_applies_when_unset() {
        let page = filter_and_paginate(
            companies(),
            ListQuery {
                page_size: None,
                ..Default::default()
            },
            3,
        );
        assert_eq!(page.page_size, 3);
        assert_eq!(page.items.len(), 3);
    }
}
