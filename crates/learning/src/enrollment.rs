use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use eduhub_catalog::Course;
use eduhub_core::{CourseId, DomainError, DomainResult, LessonId};

use crate::progress::progress_percent;

/// Link between one student and one course, embedded in the student's document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    course_id: CourseId,
    enrolled_at: DateTime<Utc>,
    progress_percent: u8,
    completed_lessons: BTreeSet<LessonId>,
}

impl Enrollment {
    pub fn new(course_id: CourseId, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            course_id,
            enrolled_at,
            progress_percent: 0,
            completed_lessons: BTreeSet::new(),
        }
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    /// Progress as of the last completion, in `[0, 100]`.
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn completed_lessons(&self) -> &BTreeSet<LessonId> {
        &self.completed_lessons
    }

    pub fn has_completed(&self, lesson_id: LessonId) -> bool {
        self.completed_lessons.contains(&lesson_id)
    }

    /// Mark `lesson_id` complete against a snapshot of the course.
    ///
    /// Completion is not idempotent: a repeat is rejected and leaves the
    /// enrollment untouched. Returns the recomputed progress.
    pub fn complete_lesson(&mut self, course: &Course, lesson_id: LessonId) -> DomainResult<u8> {
        if course.id_typed() != self.course_id {
            return Err(DomainError::NotEnrolled);
        }
        if self.has_completed(lesson_id) {
            return Err(DomainError::LessonAlreadyCompleted);
        }
        if !course.has_lesson(lesson_id) {
            return Err(DomainError::not_found("lesson"));
        }

        self.completed_lessons.insert(lesson_id);
        Ok(self.recompute_progress(course))
    }

    /// Recompute progress against the course's live lesson list.
    ///
    /// Completed lessons that were later removed from the course are
    /// dropped, so the completed set stays a subset of the course's lessons.
    pub fn recompute_progress(&mut self, course: &Course) -> u8 {
        self.completed_lessons.retain(|id| course.has_lesson(*id));
        self.progress_percent =
            progress_percent(self.completed_lessons.len(), course.lesson_count());
        self.progress_percent
    }
}
