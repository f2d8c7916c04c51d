//! Course duration aggregation.

use crate::lesson::Lesson;

/// Sum of lesson durations in minutes; 0 for an empty course.
///
/// Accumulates in `u64` so the sum of any lesson list is exact.
pub fn total_duration(lessons: &[Lesson]) -> u64 {
    lessons.iter().map(|l| u64::from(l.duration_minutes)).sum()
}
