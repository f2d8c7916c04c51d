//! Enrollment lifecycle: enroll, unenroll, complete lesson.
//!
//! An enrollment lives in two documents: the student's enrollment list and the
//! course's student set. The student side is written first; the course side
//! follows with its own retries, and if it cannot be applied the student-side
//! write is compensated so that neither or both views change.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use eduhub_auth::{Principal, Role, require_role};
use eduhub_core::{CourseId, DomainError, DomainResult, ExpectedVersion, LessonId, UserId};
use eduhub_learning::{Enrollment, User};

use super::{CourseStore, ServiceSettings, Stores, UserStore, load_course, load_user, with_retries};
use crate::locks::KeyedLocks;

pub struct EnrollmentService {
    courses: CourseStore,
    users: UserStore,
    locks: Arc<KeyedLocks<(UserId, CourseId)>>,
    max_attempts: u32,
}

impl EnrollmentService {
    pub fn new(stores: Stores, settings: ServiceSettings) -> Self {
        Self {
            courses: stores.courses,
            users: stores.users,
            locks: Arc::new(KeyedLocks::new()),
            max_attempts: settings.max_attempts,
        }
    }

    /// Enroll the calling student in a published course.
    pub fn enroll(&self, principal: &Principal, course_id: CourseId) -> DomainResult<Enrollment> {
        require_role(principal, &[Role::Student], "enroll in courses")?;
        let student_id = principal.user_id;

        self.locks.with_lock(&(student_id, course_id), || {
            let enrollment = with_retries(self.max_attempts, "enroll.student", || {
                let course = load_course(&self.courses, course_id)?;
                let mut student = load_user(&self.users, student_id)?;
                let enrollment = student.value.enroll(&course.value, Utc::now())?.clone();
                self.users.update(
                    &student_id,
                    student.value,
                    ExpectedVersion::Exact(student.version),
                )?;
                Ok(enrollment)
            })?;

            if let Err(err) = self.add_to_course(course_id, student_id) {
                warn!(%student_id, %course_id, error = %err, "course side of enroll failed; compensating");
                self.compensate(student_id, course_id, "enroll.compensate", |student| {
                    student.unenroll(course_id, Utc::now()).map(|_| ())
                });
                return Err(err);
            }

            info!(%student_id, %course_id, "student enrolled");
            Ok(enrollment)
        })
    }

    /// Remove the caller's enrollment from both the student and the course.
    pub fn unenroll(&self, principal: &Principal, course_id: CourseId) -> DomainResult<()> {
        let student_id = principal.user_id;

        self.locks.with_lock(&(student_id, course_id), || {
            let removed = with_retries(self.max_attempts, "unenroll.student", || {
                let mut student = load_user(&self.users, student_id)?;
                let removed = student.value.unenroll(course_id, Utc::now())?;
                self.users.update(
                    &student_id,
                    student.value,
                    ExpectedVersion::Exact(student.version),
                )?;
                Ok(removed)
            })?;

            if let Err(err) = self.remove_from_course(course_id, student_id) {
                warn!(%student_id, %course_id, error = %err, "course side of unenroll failed; compensating");
                self.compensate(student_id, course_id, "unenroll.compensate", |student| {
                    student.restore_enrollment(removed.clone(), Utc::now());
                    Ok(())
                });
                return Err(err);
            }

            info!(%student_id, %course_id, "student unenrolled");
            Ok(())
        })
    }

    /// Mark a lesson complete for the caller and return the new progress.
    ///
    /// Progress is computed against the course as read during this call.
    pub fn complete_lesson(
        &self,
        principal: &Principal,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> DomainResult<u8> {
        let student_id = principal.user_id;

        self.locks.with_lock(&(student_id, course_id), || {
            let progress = with_retries(self.max_attempts, "complete_lesson", || {
                let course = load_course(&self.courses, course_id)?;
                let mut student = load_user(&self.users, student_id)?;
                let progress = student
                    .value
                    .complete_lesson(&course.value, lesson_id, Utc::now())?;
                self.users.update(
                    &student_id,
                    student.value,
                    ExpectedVersion::Exact(student.version),
                )?;
                Ok(progress)
            })?;

            info!(%student_id, %course_id, %lesson_id, progress, "lesson completed");
            Ok(progress)
        })
    }

    fn add_to_course(&self, course_id: CourseId, student_id: UserId) -> DomainResult<()> {
        with_retries(self.max_attempts, "enroll.course", || {
            let mut course = load_course(&self.courses, course_id)?;
            if course.value.add_student(student_id) {
                self.courses.update(
                    &course_id,
                    course.value,
                    ExpectedVersion::Exact(course.version),
                )?;
            }
            Ok(())
        })
    }

    fn remove_from_course(&self, course_id: CourseId, student_id: UserId) -> DomainResult<()> {
        with_retries(self.max_attempts, "unenroll.course", || {
            let mut course = match load_course(&self.courses, course_id) {
                Ok(course) => course,
                // Nothing left to detach from.
                Err(DomainError::NotFound(_)) => return Ok(()),
                Err(err) => return Err(err),
            };
            if course.value.remove_student(student_id) {
                self.courses.update(
                    &course_id,
                    course.value,
                    ExpectedVersion::Exact(course.version),
                )?;
            }
            Ok(())
        })
    }

    /// Undo a student-side write. Failures are logged; the caller already
    /// reports the original error.
    fn compensate(
        &self,
        student_id: UserId,
        course_id: CourseId,
        op: &'static str,
        undo: impl Fn(&mut User) -> DomainResult<()>,
    ) {
        let result = with_retries(self.max_attempts, op, || {
            let mut student = load_user(&self.users, student_id)?;
            match undo(&mut student.value) {
                Ok(()) => {}
                // Already in the desired state.
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
            tracing::error!(
                %student_id,
                %course_id,
                op,
                error = %err,
                "compensation failed; student and course views disagree"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use eduhub_auth::Role;
    use eduhub_catalog::{Course, CoursePatch};

    use super::super::testing::{FlakyStore, course_with_lessons, register};
    use super::super::{Services, Stores};
    use crate::store::InMemoryDocumentStore;
    use super::*;

    fn services() -> Services {
        Services::in_memory(ServiceSettings::default())
    }

    fn flaky_courses() -> (Services, Arc<FlakyStore<CourseId, Course>>) {
        let courses: Arc<FlakyStore<CourseId, Course>> = Arc::new(FlakyStore::new("course"));
        let users: Arc<InMemoryDocumentStore<UserId, User>> =
            Arc::new(InMemoryDocumentStore::new("user"));
        let stores = Stores {
            courses: courses.clone(),
            users,
        };
        (Services::new(stores, ServiceSettings::default()), courses)
    }

    fn student_view(services: &Services, student: &Principal) -> User {
        services.users.profile(student.user_id).unwrap()
    }

    fn course_students(services: &Services, course_id: CourseId) -> usize {
        services.courses.get_detail(course_id).unwrap().student_count
    }

    #[test]
    fn enroll_starts_at_zero_and_updates_both_sides() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45, 60]);

        let enrollment = s.enrollments.enroll(&student, course_id).unwrap();
        assert_eq!(enrollment.progress_percent(), 0);
        assert!(enrollment.completed_lessons().is_empty());

        assert!(student_view(&s, &student).is_enrolled(course_id));
        assert_eq!(course_students(&s, course_id), 1);
    }

    #[test]
    fn second_enroll_is_rejected_without_changes() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);

        s.enrollments.enroll(&student, course_id).unwrap();
        let err = s.enrollments.enroll(&student, course_id).unwrap_err();
        assert_eq!(err, DomainError::AlreadyEnrolled);
        assert_eq!(student_view(&s, &student).enrollments().len(), 1);
        assert_eq!(course_students(&s, course_id), 1);
    }

    #[test]
    fn unpublished_course_cannot_be_joined() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);
        s.courses
            .update(
                &instructor,
                course_id,
                CoursePatch {
                    is_published: Some(false),
                    ..CoursePatch::default()
                },
            )
            .unwrap();

        let err = s.enrollments.enroll(&student, course_id).unwrap_err();
        assert_eq!(err, DomainError::CourseNotPublished);
        assert!(student_view(&s, &student).enrollments().is_empty());
    }

    #[test]
    fn enroll_in_missing_course_is_not_found() {
        let s = services();
        let student = register(&s, Role::Student, "Alex Thompson");
        let err = s.enrollments.enroll(&student, CourseId::new()).unwrap_err();
        assert_eq!(err, DomainError::NotFound("course"));
    }

    #[test]
    fn only_students_enroll() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);
        let err = s.enrollments.enroll(&instructor, course_id).unwrap_err();
        assert!(matches!(err, DomainError::NotAuthorized(_)));
    }

    #[test]
    fn progress_25_then_50_then_repeat_fails() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45, 60, 75, 90]);
        let lessons: Vec<_> = s
            .courses
            .get_detail(course_id)
            .unwrap()
            .lessons
            .iter()
            .map(|l| l.id)
            .collect();

        s.enrollments.enroll(&student, course_id).unwrap();
        assert_eq!(s.enrollments.complete_lesson(&student, course_id, lessons[0]).unwrap(), 25);
        assert_eq!(s.enrollments.complete_lesson(&student, course_id, lessons[1]).unwrap(), 50);

        let err = s
            .enrollments
            .complete_lesson(&student, course_id, lessons[0])
            .unwrap_err();
        assert_eq!(err, DomainError::LessonAlreadyCompleted);
        let profile = student_view(&s, &student);
        assert_eq!(profile.enrollment(course_id).unwrap().progress_percent(), 50);
    }

    #[test]
    fn removed_lesson_drops_out_of_completed_set() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45, 60, 75, 90]);
        let lessons: Vec<_> = s
            .courses
            .get_detail(course_id)
            .unwrap()
            .lessons
            .iter()
            .map(|l| l.id)
            .collect();

        s.enrollments.enroll(&student, course_id).unwrap();
        s.enrollments.complete_lesson(&student, course_id, lessons[0]).unwrap();
        s.enrollments.complete_lesson(&student, course_id, lessons[1]).unwrap();
        s.courses.remove_lesson(&instructor, course_id, lessons[0]).unwrap();

        let progress = s
            .enrollments
            .complete_lesson(&student, course_id, lessons[2])
            .unwrap();
        assert_eq!(progress, 67);

        let enrolled = s.users.enrolled_courses(student.user_id).unwrap();
        assert_eq!(enrolled[0].progress_percent, 67);
        assert_eq!(enrolled[0].completed_lessons.len(), 2);
        assert!(!enrolled[0].completed_lessons.contains(&lessons[0]));
    }

    #[test]
    fn complete_lesson_requires_enrollment_and_known_lesson() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);
        let lesson = s.courses.get_detail(course_id).unwrap().lessons[0].id;

        let err = s.enrollments.complete_lesson(&student, course_id, lesson).unwrap_err();
        assert_eq!(err, DomainError::NotEnrolled);

        s.enrollments.enroll(&student, course_id).unwrap();
        let err = s
            .enrollments
            .complete_lesson(&student, course_id, LessonId::new())
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound("lesson"));
    }

    #[test]
    fn unenroll_removes_both_sides() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);

        s.enrollments.enroll(&student, course_id).unwrap();
        s.enrollments.unenroll(&student, course_id).unwrap();

        assert!(!student_view(&s, &student).is_enrolled(course_id));
        assert_eq!(course_students(&s, course_id), 0);

        let err = s.enrollments.unenroll(&student, course_id).unwrap_err();
        assert_eq!(err, DomainError::NotEnrolled);
    }

    #[test]
    fn transient_course_conflicts_are_retried() {
        let (s, courses) = flaky_courses();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);

        courses.conflict_next(2);
        s.enrollments.enroll(&student, course_id).unwrap();
        assert_eq!(course_students(&s, course_id), 1);
    }

    #[test]
    fn exhausted_course_side_rolls_back_enroll() {
        let (s, courses) = flaky_courses();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);

        courses.conflict_always(true);
        let err = s.enrollments.enroll(&student, course_id).unwrap_err();
        assert!(matches!(err, DomainError::StorageConflict(_)));
        courses.conflict_always(false);

        assert!(!student_view(&s, &student).is_enrolled(course_id));
        assert_eq!(course_students(&s, course_id), 0);
    }

    #[test]
    fn exhausted_course_side_rolls_back_unenroll() {
        let (s, courses) = flaky_courses();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45, 60]);
        let lesson = s.courses.get_detail(course_id).unwrap().lessons[0].id;
        s.enrollments.enroll(&student, course_id).unwrap();
        s.enrollments.complete_lesson(&student, course_id, lesson).unwrap();

        courses.conflict_always(true);
        let err = s.enrollments.unenroll(&student, course_id).unwrap_err();
        assert!(matches!(err, DomainError::StorageConflict(_)));
        courses.conflict_always(false);

        let profile = student_view(&s, &student);
        let restored = profile.enrollment(course_id).unwrap();
        assert_eq!(restored.progress_percent(), 50);
        assert!(restored.has_completed(lesson));
        assert_eq!(course_students(&s, course_id), 1);
    }

    #[test]
    fn concurrent_enrolls_for_one_pair_succeed_once() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let enrollments = s.enrollments.clone();
                thread::spawn(move || enrollments.enroll(&student, course_id))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| *e == DomainError::AlreadyEnrolled)
        );
        assert_eq!(student_view(&s, &student).enrollments().len(), 1);
        assert_eq!(course_students(&s, course_id), 1);
    }

    #[test]
    fn concurrent_students_on_one_course_all_land() {
        let s = Services::in_memory(ServiceSettings {
            max_attempts: 50,
            ..ServiceSettings::default()
        });
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let course_id = course_with_lessons(&s, &instructor, &[45]);
        let students: Vec<_> = (0..6)
            .map(|i| register(&s, Role::Student, &format!("Student {i}")))
            .collect();

        let handles: Vec<_> = students
            .iter()
            .copied()
            .map(|student| {
                let enrollments = s.enrollments.clone();
                thread::spawn(move || enrollments.enroll(&student, course_id))
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }

        assert_eq!(course_students(&s, course_id), students.len());
    }

    #[test]
    fn concurrent_completions_of_one_lesson_succeed_once() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45, 60, 75, 90]);
        let lesson = s.courses.get_detail(course_id).unwrap().lessons[0].id;
        s.enrollments.enroll(&student, course_id).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let enrollments = s.enrollments.clone();
                thread::spawn(move || enrollments.complete_lesson(&student, course_id, lesson))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(successes.len(), 1);
        assert_eq!(*successes[0], 25);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| *e == DomainError::LessonAlreadyCompleted)
        );

        let profile = student_view(&s, &student);
        let enrollment = profile.enrollment(course_id).unwrap();
        assert_eq!(enrollment.progress_percent(), 25);
        assert_eq!(enrollment.completed_lessons().len(), 1);
    }

    #[test]
    fn concurrent_completions_of_distinct_lessons_all_count() {
        let s = services();
        let instructor = register(&s, Role::Instructor, "Sarah Johnson");
        let student = register(&s, Role::Student, "Alex Thompson");
        let course_id = course_with_lessons(&s, &instructor, &[45, 60, 75, 90]);
        let lessons: Vec<_> = s
            .courses
            .get_detail(course_id)
            .unwrap()
            .lessons
            .iter()
            .map(|l| l.id)
            .collect();
        s.enrollments.enroll(&student, course_id).unwrap();

        let handles: Vec<_> = lessons[..3]
            .iter()
            .copied()
            .map(|lesson| {
                let enrollments = s.enrollments.clone();
                thread::spawn(move || enrollments.complete_lesson(&student, course_id, lesson))
            })
            .collect();
        let mut progress: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        progress.sort_unstable();
        assert_eq!(progress, vec![25, 50, 75]);

        let profile = student_view(&s, &student);
        let enrollment = profile.enrollment(course_id).unwrap();
        assert_eq!(enrollment.completed_lessons().len(), 3);
        assert_eq!(enrollment.progress_percent(), 75);
    }
}
