//! Course catalogue domain module.
//!
//! Business rules for courses and their lessons, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod course;
pub mod duration;
pub mod lesson;
pub mod listing;

pub use course::{Category, Course, CoursePatch, Level, NewCourse, Rating};
pub use duration::total_duration;
pub use lesson::{Lesson, LessonPatch, NewLesson};
pub use listing::{CourseFilter, Page, PageRequest, select_published};
