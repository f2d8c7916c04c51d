//! Published-course listing: filtering, ordering and pagination.

use serde::Serialize;

use eduhub_core::{DomainError, DomainResult};

use crate::course::{Category, Course, Level};

/// Listing filter. Every present criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub category: Option<Category>,
    pub level: Option<Level>,
    /// Case-insensitive substring matched against title, description or any tag.
    pub search: Option<String>,
}

impl CourseFilter {
    /// Whether a course is listed under this filter. Unpublished courses never are.
    pub fn matches(&self, course: &Course) -> bool {
        if !course.is_published() {
            return false;
        }
        if self.category.is_some_and(|c| c != course.category()) {
            return false;
        }
        if self.level.is_some_and(|l| l != course.level()) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                course.title().to_lowercase().contains(&needle)
                    || course.description().to_lowercase().contains(&needle)
                    || course
                        .tags()
                        .iter()
                        .any(|t| t.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// 1-indexed page request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> DomainResult<Self> {
        if page == 0 {
            return Err(DomainError::validation("page", "Page must be at least 1"));
        }
        if limit == 0 {
            return Err(DomainError::validation("limit", "Limit must be at least 1"));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: u32,
}

impl<T> Page<T> {
    /// Slice `all` (already ordered) according to `request`.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let limit = request.limit() as usize;
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(limit)
            .collect();

        Self {
            items,
            total,
            total_pages: total.div_ceil(limit),
            current_page: request.page(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

/// Filter published courses, order newest first, and cut one page.
pub fn select_published(
    courses: Vec<Course>,
    filter: &CourseFilter,
    request: PageRequest,
) -> Page<Course> {
    let mut matching: Vec<Course> = courses.into_iter().filter(|c| filter.matches(c)).collect();
    // Ids are time-ordered, so they break ties between equal timestamps.
    matching.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id_typed().cmp(&a.id_typed()))
    });
    Page::from_ordered(matching, request)
}
