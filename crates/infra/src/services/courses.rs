//! Course catalogue management: creation, editing, lessons, deletion, listing.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use eduhub_auth::{Principal, Role, authorize_course_mutation, require_role};
use eduhub_catalog::{
    Course, CourseFilter, CoursePatch, LessonPatch, NewCourse, NewLesson, Page, PageRequest,
    select_published,
};
use eduhub_core::{CourseId, DomainError, DomainResult, ExpectedVersion, LessonId, UserId};

use super::views::{CourseView, SummaryCache};
use super::{CourseStore, ServiceSettings, Stores, UserStore, load_course, load_user, with_retries};

const COURSE_AUTHORS: &[Role] = &[Role::Instructor, Role::Admin];

pub struct CourseService {
    courses: CourseStore,
    users: UserStore,
    max_attempts: u32,
    auto_publish_on_create: bool,
}

impl CourseService {
    pub fn new(stores: Stores, settings: ServiceSettings) -> Self {
        Self {
            courses: stores.courses,
            users: stores.users,
            max_attempts: settings.max_attempts,
            auto_publish_on_create: settings.auto_publish_on_create,
        }
    }

    /// Create a course owned by the caller.
    ///
    /// `is_published` overrides `input.is_published`; when absent the
    /// configured default applies.
    pub fn create(
        &self,
        principal: &Principal,
        mut input: NewCourse,
        is_published: Option<bool>,
    ) -> DomainResult<CourseView> {
        require_role(principal, COURSE_AUTHORS, "create courses")?;
        let instructor_id = principal.user_id;
        load_user(&self.users, instructor_id)?;

        input.is_published = is_published.unwrap_or(self.auto_publish_on_create);
        let course = Course::create(CourseId::new(), instructor_id, input, Utc::now())?;
        let course_id = course.id_typed();
        self.courses.insert(course_id, course.clone())?;

        let linked = with_retries(self.max_attempts, "create_course.instructor", || {
            let mut instructor = load_user(&self.users, instructor_id)?;
            if instructor.value.add_created_course(course_id) {
                self.users.update(
                    &instructor_id,
                    instructor.value,
                    ExpectedVersion::Exact(instructor.version),
                )?;
            }
            Ok(())
        });
        if let Err(err) = linked {
            warn!(%course_id, %instructor_id, error = %err, "could not link course to instructor; removing it");
            if let Err(cleanup) = self.courses.delete(&course_id, ExpectedVersion::Any) {
                tracing::error!(%course_id, error = %cleanup, "orphaned course left behind");
            }
            return Err(err);
        }

        info!(%course_id, %instructor_id, published = course.is_published(), "course created");
        SummaryCache::new(&self.users).course_view(&course, false)
    }

    /// A single course with instructor and students populated.
    pub fn get_detail(&self, course_id: CourseId) -> DomainResult<CourseView> {
        let course = load_course(&self.courses, course_id)?;
        SummaryCache::new(&self.users).course_view(&course.value, true)
    }

    /// Published courses matching `filter`, newest first.
    pub fn list_published(
        &self,
        filter: &CourseFilter,
        request: PageRequest,
    ) -> DomainResult<Page<CourseView>> {
        let all = self
            .courses
            .list()?
            .into_iter()
            .map(|stored| stored.value)
            .collect();
        let page = select_published(all, filter, request);

        let mut cache = SummaryCache::new(&self.users);
        let mut items = Vec::with_capacity(page.items.len());
        for course in &page.items {
            items.push(cache.course_view(course, false)?);
        }
        Ok(Page {
            items,
            total: page.total,
            total_pages: page.total_pages,
            current_page: page.current_page,
        })
    }

    /// Courses created by `instructor_id`, in creation order.
    pub fn created_by(&self, instructor_id: UserId) -> DomainResult<Vec<CourseView>> {
        let instructor = load_user(&self.users, instructor_id)?;
        let mut cache = SummaryCache::new(&self.users);
        let mut out = Vec::new();
        for course_id in instructor.value.created_courses() {
            if let Some(course) = self.courses.get(course_id)? {
                out.push(cache.course_view(&course.value, false)?);
            }
        }
        Ok(out)
    }

    pub fn update(
        &self,
        principal: &Principal,
        course_id: CourseId,
        patch: CoursePatch,
    ) -> DomainResult<CourseView> {
        let (course, ()) = self.mutate(principal, course_id, "update this course", |course, now| {
            course.apply_patch(patch.clone(), now)
        })?;
        info!(%course_id, "course updated");
        SummaryCache::new(&self.users).course_view(&course, false)
    }

    pub fn add_lesson(
        &self,
        principal: &Principal,
        course_id: CourseId,
        input: NewLesson,
    ) -> DomainResult<(LessonId, CourseView)> {
        require_role(principal, COURSE_AUTHORS, "add lessons")?;
        let (course, lesson_id) =
            self.mutate(principal, course_id, "add lessons to this course", |course, now| {
                course.add_lesson(input.clone(), now)
            })?;

        info!(%course_id, %lesson_id, total_duration = course.total_duration(), "lesson added");
        Ok((lesson_id, SummaryCache::new(&self.users).course_view(&course, false)?))
    }

    pub fn update_lesson(
        &self,
        principal: &Principal,
        course_id: CourseId,
        lesson_id: LessonId,
        patch: LessonPatch,
    ) -> DomainResult<CourseView> {
        require_role(principal, COURSE_AUTHORS, "edit lessons")?;
        let (course, ()) = self.mutate(principal, course_id, "edit lessons of this course", |course, now| {
            course.update_lesson(lesson_id, patch.clone(), now)
        })?;
        info!(%course_id, %lesson_id, total_duration = course.total_duration(), "lesson updated");
        SummaryCache::new(&self.users).course_view(&course, false)
    }

    pub fn remove_lesson(
        &self,
        principal: &Principal,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> DomainResult<CourseView> {
        require_role(principal, COURSE_AUTHORS, "remove lessons")?;
        let (course, ()) = self.mutate(
            principal,
            course_id,
            "remove lessons from this course",
            |course, now| course.remove_lesson(lesson_id, now).map(|_| ()),
        )?;
        info!(%course_id, %lesson_id, total_duration = course.total_duration(), "lesson removed");
        SummaryCache::new(&self.users).course_view(&course, false)
    }

    /// Delete a course and detach it from its instructor and students.
    pub fn delete(&self, principal: &Principal, course_id: CourseId) -> DomainResult<()> {
        let deleted = with_retries(self.max_attempts, "delete_course", || {
            let course = load_course(&self.courses, course_id)?;
            authorize_course_mutation(principal, course.value.instructor_id(), "delete this course")?;
            self.courses
                .delete(&course_id, ExpectedVersion::Exact(course.version))?;
            Ok(course.value)
        })?;

        self.detach_instructor(deleted.instructor_id(), course_id);
        for student_id in deleted.students() {
            self.detach_student(*student_id, course_id);
        }

        info!(%course_id, students = deleted.students().len(), "course deleted");
        Ok(())
    }

    /// Load, authorize, mutate and conditionally write back one course.
    ///
    /// The ownership check runs on every attempt, before `change`.
    fn mutate<T>(
        &self,
        principal: &Principal,
        course_id: CourseId,
        action: &'static str,
        mut change: impl FnMut(&mut Course, DateTime<Utc>) -> DomainResult<T>,
    ) -> DomainResult<(Course, T)> {
        with_retries(self.max_attempts, action, || {
            let mut course = load_course(&self.courses, course_id)?;
            authorize_course_mutation(principal, course.value.instructor_id(), action)?;
            let out = change(&mut course.value, Utc::now())?;
            self.courses.update(
                &course_id,
                course.value.clone(),
                ExpectedVersion::Exact(course.version),
            )?;
            Ok((course.value, out))
        })
    }

    fn detach_instructor(&self, instructor_id: UserId, course_id: CourseId) {
        let result = with_retries(self.max_attempts, "delete_course.instructor", || {
            let mut instructor = match self.users.get(&instructor_id)? {
                Some(user) => user,
                None => return Ok(()),
            };
            if instructor.value.remove_created_course(course_id) {
                self.users.update(
                    &instructor_id,
                    instructor.value,
                    ExpectedVersion::Exact(instructor.version),
                )?;
            }
            Ok(())
        });
        if let Err(err) = result {
            tracing::error!(%course_id, %instructor_id, error = %err, "deleted course still listed for instructor");
        }
    }

    fn detach_student(&self, student_id: UserId, course_id: CourseId) {
        let result = with_retries(self.max_attempts, "delete_course.student", || {
            let mut student = match self.users.get(&student_id)? {
                Some(user) => user,
                None => return Ok(()),
            };
            match student.value.unenroll(course_id, Utc::now()) {
                Ok(_) => {}
                Err(DomainError::NotEnrolled) => return Ok(()),
                Err(err) => return Err(err),
            }
            self.users.update(
                &student_id,
                student.value,
                ExpectedVersion::Exact(student.version),
            )?;
            Ok(())
        });
        if let Err(err) = result {
            tracing::error!(%course_id, %student_id, error = %err, "deleted course still listed for student");
        }
    }
}
