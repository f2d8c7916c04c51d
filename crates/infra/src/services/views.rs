//! Read views with references resolved to user summaries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use eduhub_catalog::{Category, Course, Lesson, Level, Rating};
use eduhub_core::{CourseId, DomainResult, LessonId, UserId};
use eduhub_learning::{Enrollment, User};

use super::UserStore;

/// Public part of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_typed(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            avatar: user.avatar().to_string(),
            bio: user.bio().to_string(),
        }
    }
}

/// A course with its instructor (and optionally its students) populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub instructor_id: UserId,
    /// `None` when the instructor's profile no longer exists.
    pub instructor: Option<UserSummary>,
    pub category: Category,
    pub level: Level,
    pub price: f64,
    pub thumbnail: String,
    pub tags: Vec<String>,
    pub lessons: Vec<Lesson>,
    pub student_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<UserSummary>>,
    pub rating: Rating,
    pub total_duration: u64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseView {
    pub fn new(
        course: &Course,
        instructor: Option<UserSummary>,
        students: Option<Vec<UserSummary>>,
    ) -> Self {
        Self {
            id: course.id_typed(),
            title: course.title().to_string(),
            description: course.description().to_string(),
            short_description: course.short_description().to_string(),
            instructor_id: course.instructor_id(),
            instructor,
            category: course.category(),
            level: course.level(),
            price: course.price(),
            thumbnail: course.thumbnail().to_string(),
            tags: course.tags().to_vec(),
            lessons: course.lessons().to_vec(),
            student_count: course.students().len(),
            students,
            rating: course.rating(),
            total_duration: course.total_duration(),
            is_published: course.is_published(),
            created_at: course.created_at(),
            updated_at: course.updated_at(),
        }
    }
}

/// One entry of a student's enrolled-courses list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseView {
    pub course: CourseView,
    pub enrolled_at: DateTime<Utc>,
    pub progress_percent: u8,
    pub completed_lessons: Vec<LessonId>,
}

impl EnrolledCourseView {
    pub fn new(course: CourseView, enrollment: &Enrollment) -> Self {
        Self {
            course,
            enrolled_at: enrollment.enrolled_at(),
            progress_percent: enrollment.progress_percent(),
            completed_lessons: enrollment.completed_lessons().iter().copied().collect(),
        }
    }
}

/// Memoizing user lookup for populating several views at once.
pub(crate) struct SummaryCache<'a> {
    users: &'a UserStore,
    seen: HashMap<UserId, Option<UserSummary>>,
}

impl<'a> SummaryCache<'a> {
    pub(crate) fn new(users: &'a UserStore) -> Self {
        Self {
            users,
            seen: HashMap::new(),
        }
    }

    pub(crate) fn get(&mut self, id: UserId) -> DomainResult<Option<UserSummary>> {
        if let Some(hit) = self.seen.get(&id) {
            return Ok(hit.clone());
        }
        let summary = self.users.get(&id)?.map(|u| UserSummary::from(&u.value));
        self.seen.insert(id, summary.clone());
        Ok(summary)
    }

    /// Resolve every id, skipping users that no longer exist.
    pub(crate) fn all(&mut self, ids: impl IntoIterator<Item = UserId>) -> DomainResult<Vec<UserSummary>> {
        let mut out = Vec::new();
        for id in ids {
            if let Some(summary) = self.get(id)? {
                out.push(summary);
            }
        }
        Ok(out)
    }

    pub(crate) fn course_view(&mut self, course: &Course, with_students: bool) -> DomainResult<CourseView> {
        let instructor = self.get(course.instructor_id())?;
        let students = if with_students {
            Some(self.all(course.students().iter().copied())?)
        } else {
            None
        };
        Ok(CourseView::new(course, instructor, students))
    }
}
