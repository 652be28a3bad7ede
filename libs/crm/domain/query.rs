//! Filtering, sorting and pagination over fetched lists
//!
//! Applied in that order: filter -> sort -> paginate. Page numbers are
//! 1-based. Date fields are ISO strings and compare lexicographically;
//! rows missing the sort field always go last.

use super::models::{Lead, LeadStatus, Task, TaskStatus};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Sort key shared by lead and task queries
///
/// Records lacking a field map it to their nearest counterpart: leads sort
/// `DueDate` by follow-up date, tasks sort `FollowUpDate` by due date and
/// `UpdatedAt` by creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Lead name or task title
    Name,
    Status,
    #[default]
    CreatedAt,
    UpdatedAt,
    /// Lead follow-up date; task due date
    FollowUpDate,
    /// Task due date; lead follow-up date
    DueDate,
}

/// One page of a filtered, sorted list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Slice `items` into the requested 1-based page
///
/// An out-of-range page yields no items but keeps the totals.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page);

    let items = items.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

/// Compare optional strings with `None` always last
fn cmp_optional(a: Option<&str>, b: Option<&str>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => apply_order(x.cmp(y), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn apply_order(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[derive(Debug, Clone)]
pub struct LeadQuery {
    pub status: Option<LeadStatus>,
    pub assigned_to: Option<String>,
    /// Case-insensitive substring over name, phone and email
    pub search: Option<String>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            status: None,
            assigned_to: None,
            search: None,
            sort_field: SortField::CreatedAt,
            sort_order: SortOrder::Descending,
            page: 1,
            per_page: 20,
        }
    }
}

impl LeadQuery {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(status) = &self.status {
            if &lead.status != status {
                return false;
            }
        }

        if let Some(assignee) = &self.assigned_to {
            if lead.assigned_to.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }

        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = contains_ci(&lead.name, &term)
                || contains_ci(&lead.phone, &term)
                || lead.email.as_deref().is_some_and(|e| contains_ci(e, &term));
            if !hit {
                return false;
            }
        }

        true
    }

    fn compare(&self, a: &Lead, b: &Lead) -> Ordering {
        match self.sort_field {
            SortField::Name => apply_order(
                a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                self.sort_order,
            ),
            SortField::Status => apply_order(a.status.as_str().cmp(b.status.as_str()), self.sort_order),
            SortField::CreatedAt => {
                cmp_optional(a.created_at.as_deref(), b.created_at.as_deref(), self.sort_order)
            }
            SortField::UpdatedAt => {
                cmp_optional(a.updated_at.as_deref(), b.updated_at.as_deref(), self.sort_order)
            }
            SortField::FollowUpDate | SortField::DueDate => cmp_optional(
                a.follow_up_date.as_deref(),
                b.follow_up_date.as_deref(),
                self.sort_order,
            ),
        }
    }

    pub fn apply(&self, leads: &[Lead]) -> Page<Lead> {
        let mut filtered: Vec<Lead> = leads.iter().filter(|l| self.matches(l)).cloned().collect();
        filtered.sort_by(|a, b| self.compare(a, b));
        paginate(filtered, self.page, self.per_page)
    }
}

#[derive(Debug, Clone)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub open_only: bool,
    pub lead_id: Option<String>,
    pub search: Option<String>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            open_only: false,
            lead_id: None,
            search: None,
            sort_field: SortField::DueDate,
            sort_order: SortOrder::Ascending,
            page: 1,
            per_page: 20,
        }
    }
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        if self.open_only && !task.status.is_open() {
            return false;
        }
        if let Some(status) = &self.status {
            if &task.status != status {
                return false;
            }
        }
        if let Some(lead_id) = &self.lead_id {
            if task.lead_id.as_deref() != Some(lead_id.as_str()) {
                return false;
            }
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = contains_ci(&task.title, &term)
                || task.description.as_deref().is_some_and(|d| contains_ci(d, &term));
            if !hit {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self.sort_field {
            SortField::Name => apply_order(
                a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                self.sort_order,
            ),
            SortField::Status => apply_order(a.status.as_str().cmp(b.status.as_str()), self.sort_order),
            SortField::CreatedAt | SortField::UpdatedAt => {
                cmp_optional(a.created_at.as_deref(), b.created_at.as_deref(), self.sort_order)
            }
            SortField::DueDate | SortField::FollowUpDate => {
                cmp_optional(a.due_date.as_deref(), b.due_date.as_deref(), self.sort_order)
            }
        }
    }

    pub fn apply(&self, tasks: &[Task]) -> Page<Task> {
        let mut filtered: Vec<Task> = tasks.iter().filter(|t| self.matches(t)).cloned().collect();
        filtered.sort_by(|a, b| self.compare(a, b));
        paginate(filtered, self.page, self.per_page)
    }
}
