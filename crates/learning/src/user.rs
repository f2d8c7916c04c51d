use chrono::{DateTime, Utc};
use serde::Serialize;

use eduhub_auth::Role;
use eduhub_catalog::Course;
use eduhub_core::validation::{is_http_url, trimmed_len};
use eduhub_core::{
    AggregateRoot, CourseId, DomainError, DomainResult, LessonId, UserId, Validator,
};

use crate::enrollment::Enrollment;

pub const BIO_MAX: usize = 500;

/// Input for registering a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub avatar: String,
}

/// Profile edit. Only name, bio and avatar are user-editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    /// Empty string clears the avatar.
    pub avatar: Option<String>,
}

impl ProfilePatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            check_name(&mut v, name);
        }
        if let Some(bio) = &self.bio {
            check_bio(&mut v, bio);
        }
        if let Some(avatar) = &self.avatar {
            check_avatar(&mut v, avatar);
        }
        v.finish()
    }
}

/// Aggregate root: a user document.
///
/// Students own their enrollments; instructors keep the list of courses they
/// created. Both lists mirror state stored on the course side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    bio: String,
    avatar: String,
    enrolled_courses: Vec<Enrollment>,
    created_courses: Vec<CourseId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AggregateRoot for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl User {
    pub fn register(id: UserId, role: Role, input: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut v = Validator::new();
        check_name(&mut v, &input.name);
        v.check(
            input.email.contains('@') && trimmed_len(&input.email) >= 3,
            "email",
            "Please include a valid email",
        );
        check_bio(&mut v, &input.bio);
        check_avatar(&mut v, &input.avatar);
        v.finish()?;

        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            role,
            bio: input.bio.trim().to_string(),
            avatar: input.avatar.trim().to_string(),
            enrolled_courses: Vec::new(),
            created_courses: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn bio(&self) -> &str {
        &self.bio
    }

    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    pub fn enrollments(&self) -> &[Enrollment] {
        &self.enrolled_courses
    }

    pub fn created_courses(&self) -> &[CourseId] {
        &self.created_courses
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn enrollment(&self, course_id: CourseId) -> Option<&Enrollment> {
        self.enrolled_courses.iter().find(|e| e.course_id() == course_id)
    }

    pub fn is_enrolled(&self, course_id: CourseId) -> bool {
        self.enrollment(course_id).is_some()
    }

    /// Append a fresh enrollment for a published course.
    ///
    /// At most one enrollment per course.
    pub fn enroll(&mut self, course: &Course, now: DateTime<Utc>) -> DomainResult<&Enrollment> {
        if !course.is_published() {
            return Err(DomainError::CourseNotPublished);
        }
        let course_id = course.id_typed();
        if self.is_enrolled(course_id) {
            return Err(DomainError::AlreadyEnrolled);
        }
        self.enrolled_courses.push(Enrollment::new(course_id, now));
        self.updated_at = now;

        let idx = self.enrolled_courses.len() - 1;
        Ok(&self.enrolled_courses[idx])
    }

    /// Remove the enrollment for `course_id` entirely.
    pub fn unenroll(&mut self, course_id: CourseId, now: DateTime<Utc>) -> DomainResult<Enrollment> {
        let idx = self
            .enrolled_courses
            .iter()
            .position(|e| e.course_id() == course_id)
            .ok_or(DomainError::NotEnrolled)?;
        self.updated_at = now;
        Ok(self.enrolled_courses.remove(idx))
    }

    /// Put back an enrollment removed by [`User::unenroll`]; no-op if one exists.
    pub fn restore_enrollment(&mut self, enrollment: Enrollment, now: DateTime<Utc>) -> bool {
        if self.is_enrolled(enrollment.course_id()) {
            return false;
        }
        self.enrolled_courses.push(enrollment);
        self.updated_at = now;
        true
    }

    pub fn complete_lesson(
        &mut self,
        course: &Course,
        lesson_id: LessonId,
        now: DateTime<Utc>,
    ) -> DomainResult<u8> {
        let course_id = course.id_typed();
        let enrollment = self
            .enrolled_courses
            .iter_mut()
            .find(|e| e.course_id() == course_id)
            .ok_or(DomainError::NotEnrolled)?;
        let progress = enrollment.complete_lesson(course, lesson_id)?;
        self.updated_at = now;
        Ok(progress)
    }

    /// Record authorship of a course. Returns `false` if already recorded.
    pub fn add_created_course(&mut self, course_id: CourseId) -> bool {
        if self.created_courses.contains(&course_id) {
            return false;
        }
        self.created_courses.push(course_id);
        true
    }

    pub fn remove_created_course(&mut self, course_id: CourseId) -> bool {
        let before = self.created_courses.len();
        self.created_courses.retain(|c| *c != course_id);
        before != self.created_courses.len()
    }

    pub fn apply_profile(&mut self, patch: ProfilePatch, now: DateTime<Utc>) -> DomainResult<()> {
        patch.validate()?;
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(bio) = patch.bio {
            self.bio = bio.trim().to_string();
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = avatar.trim().to_string();
        }
        self.updated_at = now;
        Ok(())
    }
}

fn check_name(v: &mut Validator, name: &str) {
    v.check(trimmed_len(name) >= 2, "name", "Name must be at least 2 characters");
}

fn check_bio(v: &mut Validator, bio: &str) {
    v.check(
        trimmed_len(bio) <= BIO_MAX,
        "bio",
        "Bio must be less than 500 characters",
    );
}

fn check_avatar(v: &mut Validator, avatar: &str) {
    v.check(
        avatar.trim().is_empty() || is_http_url(avatar),
        "avatar",
        "Avatar must be a valid URL",
    );
}
