//! Application services.
//!
//! Services load whole documents, run the domain methods on them and write
//! them back with an exact expected version. A stale write surfaces as
//! `DomainError::StorageConflict` and the read-modify-write is retried up to
//! the configured number of attempts.

use std::sync::Arc;

use eduhub_catalog::Course;
use eduhub_core::{CourseId, DomainError, DomainResult, UserId};
use eduhub_learning::User;

use crate::config::AppConfig;
use crate::store::{DocumentStore, InMemoryDocumentStore, Versioned};

pub mod courses;
pub mod enrollment;
pub mod users;
pub mod views;

pub use courses::CourseService;
pub use enrollment::EnrollmentService;
pub use users::UserService;
pub use views::{CourseView, EnrolledCourseView, UserSummary};

pub type CourseStore = Arc<dyn DocumentStore<CourseId, Course>>;
pub type UserStore = Arc<dyn DocumentStore<UserId, User>>;

/// The two document collections.
#[derive(Clone)]
pub struct Stores {
    pub courses: CourseStore,
    pub users: UserStore,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            courses: Arc::new(InMemoryDocumentStore::<CourseId, Course>::new("course")),
            users: Arc::new(InMemoryDocumentStore::<UserId, User>::new("user")),
        }
    }
}

/// Tunables shared by the services.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub max_attempts: u32,
    pub auto_publish_on_create: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ServiceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.enrollment_max_attempts.max(1),
            auto_publish_on_create: config.auto_publish_on_create,
        }
    }
}

/// All services over one pair of stores.
#[derive(Clone)]
pub struct Services {
    pub courses: Arc<CourseService>,
    pub enrollments: Arc<EnrollmentService>,
    pub users: Arc<UserService>,
    stores: Stores,
}

impl Services {
    pub fn new(stores: Stores, settings: ServiceSettings) -> Self {
        Self {
            courses: Arc::new(CourseService::new(stores.clone(), settings)),
            enrollments: Arc::new(EnrollmentService::new(stores.clone(), settings)),
            users: Arc::new(UserService::new(stores.clone(), settings)),
            stores,
        }
    }

    pub fn in_memory(settings: ServiceSettings) -> Self {
        Self::new(Stores::in_memory(), settings)
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }
}

pub(crate) fn load_course(store: &CourseStore, id: CourseId) -> DomainResult<Versioned<Course>> {
    store.get(&id)?.ok_or(DomainError::NotFound("course"))
}

pub(crate) fn load_user(store: &UserStore, id: UserId) -> DomainResult<Versioned<User>> {
    store.get(&id)?.ok_or(DomainError::NotFound("user"))
}

/// Run `op` until it succeeds, fails terminally, or `max_attempts` storage
/// conflicts have been seen.
pub(crate) fn with_retries<T>(
    max_attempts: u32,
    op: &'static str,
    mut f: impl FnMut() -> DomainResult<T>,
) -> DomainResult<T> {
    let mut attempt = 1;
    loop {
        match f() {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                tracing::debug!(op, attempt, error = %err, "storage conflict; retrying");
                attempt += 1;
            }
            Err(err) if err.is_retryable() => {
                tracing::warn!(op, attempt, error = %err, "storage conflict; giving up");
                return Err(err);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Store doubles and fixtures for service tests.

    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use eduhub_auth::{Principal, Role};
    use eduhub_catalog::{Category, Level, NewCourse, NewLesson};
    use eduhub_core::ExpectedVersion;
    use eduhub_learning::NewUser;

    use super::*;
    use crate::store::StoreError;

    /// Wraps an in-memory store and injects version conflicts on updates.
    pub struct FlakyStore<K, V> {
        entity: &'static str,
        inner: InMemoryDocumentStore<K, V>,
        /// Conflicts still to inject before updates go through.
        pending_conflicts: AtomicU32,
        /// When set, every update conflicts.
        always_conflict: AtomicBool,
    }

    impl<K, V> FlakyStore<K, V> {
        pub fn new(entity: &'static str) -> Self {
            Self {
                entity,
                inner: InMemoryDocumentStore::new(entity),
                pending_conflicts: AtomicU32::new(0),
                always_conflict: AtomicBool::new(false),
            }
        }

        pub fn conflict_next(&self, n: u32) {
            self.pending_conflicts.store(n, Ordering::SeqCst);
        }

        pub fn conflict_always(&self, on: bool) {
            self.always_conflict.store(on, Ordering::SeqCst);
        }

        fn injected(&self) -> Option<StoreError> {
            let take_one = self
                .pending_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if take_one || self.always_conflict.load(Ordering::SeqCst) {
                Some(StoreError::Conflict {
                    entity: self.entity,
                    expected: ExpectedVersion::Any,
                    actual: 0,
                })
            } else {
                None
            }
        }
    }

    impl<K, V> DocumentStore<K, V> for FlakyStore<K, V>
    where
        K: Clone + Eq + std::hash::Hash + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        fn get(&self, key: &K) -> Result<Option<Versioned<V>>, StoreError> {
            self.inner.get(key)
        }

        fn insert(&self, key: K, value: V) -> Result<u64, StoreError> {
            self.inner.insert(key, value)
        }

        fn update(&self, key: &K, value: V, expected: ExpectedVersion) -> Result<u64, StoreError> {
            if let Some(err) = self.injected() {
                return Err(err);
            }
            self.inner.update(key, value, expected)
        }

        fn delete(&self, key: &K, expected: ExpectedVersion) -> Result<(), StoreError> {
            self.inner.delete(key, expected)
        }

        fn list(&self) -> Result<Vec<Versioned<V>>, StoreError> {
            self.inner.list()
        }
    }

    pub fn register(services: &Services, role: Role, name: &str) -> Principal {
        let principal = Principal::new(UserId::new(), role);
        services
            .users
            .register(
                &principal,
                NewUser {
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                    bio: String::new(),
                    avatar: String::new(),
                },
            )
            .unwrap();
        principal
    }

    pub fn new_course(title: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            description: format!("{title}: a complete hands-on course"),
            short_description: "Learn by building real projects".to_string(),
            category: Category::Programming,
            level: Level::Beginner,
            price: 99.99,
            thumbnail: String::new(),
            tags: vec!["rust".to_string()],
            is_published: true,
        }
    }

    pub fn new_lesson(order: i32, minutes: u32) -> NewLesson {
        NewLesson {
            title: format!("Lesson {order}"),
            description: "Lesson walkthrough".to_string(),
            video_url: format!("https://example.com/video{order}"),
            duration_minutes: minutes,
            order,
            is_preview: order == 1,
        }
    }

    /// A published course owned by `instructor` with one lesson per duration.
    pub fn course_with_lessons(
        services: &Services,
        instructor: &Principal,
        durations: &[u32],
    ) -> CourseId {
        let view = services
            .courses
            .create(instructor, new_course("Complete Web Development"), Some(true))
            .unwrap();
        for (i, minutes) in durations.iter().enumerate() {
            services
                .courses
                .add_lesson(instructor, view.id, new_lesson(i as i32 + 1, *minutes))
                .unwrap();
        }
        view.id
    }
}
