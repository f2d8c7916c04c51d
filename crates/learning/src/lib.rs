//! Learning domain module: user profiles, enrollments and progress.
//!
//! Pure domain logic. A [`User`] owns its enrollments; the matching student
//! set lives on the course, and keeping both in step is the job of the
//! enrollment workflow in `eduhub-infra`.

pub mod enrollment;
pub mod progress;
pub mod user;

pub use enrollment::Enrollment;
pub use progress::progress_percent;
pub use user::{NewUser, ProfilePatch, User};
