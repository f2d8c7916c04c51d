//! User profiles.

use chrono::Utc;
use tracing::info;

use eduhub_auth::Principal;
use eduhub_core::{DomainError, DomainResult, ExpectedVersion, UserId};
use eduhub_learning::{NewUser, ProfilePatch, User};

use super::views::{EnrolledCourseView, SummaryCache};
use super::{CourseStore, ServiceSettings, Stores, UserStore, load_user, with_retries};
use crate::store::StoreError;

pub struct UserService {
    courses: CourseStore,
    users: UserStore,
    max_attempts: u32,
}

impl UserService {
    pub fn new(stores: Stores, settings: ServiceSettings) -> Self {
        Self {
            courses: stores.courses,
            users: stores.users,
            max_attempts: settings.max_attempts,
        }
    }

    /// Create the profile for an authenticated identity. The role comes from
    /// the token, never from the request body.
    pub fn register(&self, principal: &Principal, input: NewUser) -> DomainResult<User> {
        let user_id = principal.user_id;
        if self.users.get(&user_id)?.is_some() {
            return Err(DomainError::AlreadyRegistered);
        }

        let user = User::register(user_id, principal.role, input, Utc::now())?;
        match self.users.insert(user_id, user.clone()) {
            Ok(_) => {}
            Err(StoreError::Duplicate(_)) => return Err(DomainError::AlreadyRegistered),
            Err(err) => return Err(err.into()),
        }

        info!(%user_id, role = %principal.role, "user registered");
        Ok(user)
    }

    pub fn profile(&self, user_id: UserId) -> DomainResult<User> {
        Ok(load_user(&self.users, user_id)?.value)
    }

    /// Edit name, bio or avatar of the caller's own profile.
    pub fn update_profile(&self, principal: &Principal, patch: ProfilePatch) -> DomainResult<User> {
        let user_id = principal.user_id;
        let user = with_retries(self.max_attempts, "update_profile", || {
            let mut user = load_user(&self.users, user_id)?;
            user.value.apply_profile(patch.clone(), Utc::now())?;
            self.users.update(
                &user_id,
                user.value.clone(),
                ExpectedVersion::Exact(user.version),
            )?;
            Ok(user.value)
        })?;

        info!(%user_id, "profile updated");
        Ok(user)
    }

    /// The user's enrollments with each course and its instructor populated.
    ///
    /// Enrollments whose course no longer exists are skipped.
    pub fn enrolled_courses(&self, user_id: UserId) -> DomainResult<Vec<EnrolledCourseView>> {
        let user = load_user(&self.users, user_id)?.value;
        let mut cache = SummaryCache::new(&self.users);
        let mut out = Vec::with_capacity(user.enrollments().len());

        for enrollment in user.enrollments() {
            let Some(course) = self.courses.get(&enrollment.course_id())? else {
                continue;
            };
            let view = cache.course_view(&course.value, false)?;
            out.push(EnrolledCourseView::new(view, enrollment));
        }
        Ok(out)
    }
}
