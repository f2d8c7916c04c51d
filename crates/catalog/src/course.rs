use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eduhub_core::validation::trimmed_len;
use eduhub_core::{
    AggregateRoot, CourseId, DomainError, DomainResult, LessonId, UserId, Validator, ValueObject,
};

use crate::duration::total_duration;
use crate::lesson::{Lesson, LessonPatch, NewLesson};

pub const SHORT_DESCRIPTION_MAX: usize = 200;

/// Course subject area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Programming,
    Design,
    Business,
    Marketing,
    DataScience,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Programming => "programming",
            Category::Design => "design",
            Category::Business => "business",
            Category::Marketing => "marketing",
            Category::DataScience => "data-science",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "programming" => Ok(Category::Programming),
            "design" => Ok(Category::Design),
            "business" => Ok(Category::Business),
            "marketing" => Ok(Category::Marketing),
            "data-science" => Ok(Category::DataScience),
            "other" => Ok(Category::Other),
            _ => Err(DomainError::validation("category", "Invalid category")),
        }
    }
}

/// Course difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl FromStr for Level {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            _ => Err(DomainError::validation("level", "Invalid level")),
        }
    }
}

/// Aggregate review score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rating {
    /// Mean score in `[0, 5]`.
    average: f64,
    count: u32,
}

impl ValueObject for Rating {}

impl Rating {
    pub fn new(average: f64, count: u32) -> DomainResult<Self> {
        if !(0.0..=5.0).contains(&average) {
            return Err(DomainError::validation(
                "rating.average",
                "Rating must be between 0 and 5",
            ));
        }
        Ok(Self { average, count })
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Input for creating a course.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub category: Category,
    pub level: Level,
    pub price: f64,
    pub thumbnail: String,
    pub tags: Vec<String>,
    pub is_published: bool,
}

/// Partial edit of course metadata; `None` leaves the field untouched.
///
/// Lessons, students and the instructor are not editable through a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<Category>,
    pub level: Option<Level>,
    pub price: Option<f64>,
    pub thumbnail: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

impl CoursePatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            check_title(&mut v, title);
        }
        if let Some(description) = &self.description {
            check_description(&mut v, description);
        }
        if let Some(short) = &self.short_description {
            check_short_description(&mut v, short);
        }
        if let Some(price) = self.price {
            check_price(&mut v, price);
        }
        v.finish()
    }
}

/// Aggregate root: Course.
///
/// Owns its lessons. `total_duration` is derived and recomputed by every
/// method that changes the lesson list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    short_description: String,
    instructor_id: UserId,
    category: Category,
    level: Level,
    price: f64,
    thumbnail: String,
    tags: Vec<String>,
    lessons: Vec<Lesson>,
    students: BTreeSet<UserId>,
    rating: Rating,
    total_duration: u64,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AggregateRoot for Course {
    type Id = CourseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Course {
    /// Validate input and build a course with no lessons and no students.
    pub fn create(
        id: CourseId,
        instructor_id: UserId,
        input: NewCourse,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let mut v = Validator::new();
        check_title(&mut v, &input.title);
        check_description(&mut v, &input.description);
        check_short_description(&mut v, &input.short_description);
        check_price(&mut v, input.price);
        v.finish()?;

        Ok(Self {
            id,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            short_description: input.short_description.trim().to_string(),
            instructor_id,
            category: input.category,
            level: input.level,
            price: input.price,
            thumbnail: input.thumbnail,
            tags: normalize_tags(input.tags),
            lessons: Vec::new(),
            students: BTreeSet::new(),
            rating: Rating::default(),
            total_duration: 0,
            is_published: input.is_published,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> CourseId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn instructor_id(&self) -> UserId {
        self.instructor_id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Lessons sorted by `order`.
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, lesson_id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    pub fn has_lesson(&self, lesson_id: LessonId) -> bool {
        self.lesson(lesson_id).is_some()
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    pub fn students(&self) -> &BTreeSet<UserId> {
        &self.students
    }

    pub fn has_student(&self, student_id: UserId) -> bool {
        self.students.contains(&student_id)
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    /// Sum of lesson durations, in minutes.
    pub fn total_duration(&self) -> u64 {
        self.total_duration
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn apply_patch(&mut self, patch: CoursePatch, now: DateTime<Utc>) -> DomainResult<()> {
        patch.validate()?;

        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(short) = patch.short_description {
            self.short_description = short.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(thumbnail) = patch.thumbnail {
            self.thumbnail = thumbnail;
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn set_rating(&mut self, rating: Rating, now: DateTime<Utc>) {
        self.rating = rating;
        self.updated_at = now;
    }

    pub fn add_lesson(&mut self, input: NewLesson, now: DateTime<Utc>) -> DomainResult<LessonId> {
        let lesson = input.into_lesson(now)?;
        let id = lesson.id;
        self.lessons.push(lesson);
        self.lessons_changed(now);
        Ok(id)
    }

    pub fn update_lesson(
        &mut self,
        lesson_id: LessonId,
        patch: LessonPatch,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        patch.validate()?;
        let lesson = self
            .lessons
            .iter_mut()
            .find(|l| l.id == lesson_id)
            .ok_or(DomainError::not_found("lesson"))?;
        patch.apply_to(lesson, now);
        self.lessons_changed(now);
        Ok(())
    }

    pub fn remove_lesson(&mut self, lesson_id: LessonId, now: DateTime<Utc>) -> DomainResult<Lesson> {
        let idx = self
            .lessons
            .iter()
            .position(|l| l.id == lesson_id)
            .ok_or(DomainError::not_found("lesson"))?;
        let removed = self.lessons.remove(idx);
        self.lessons_changed(now);
        Ok(removed)
    }

    /// Insert into the student set. Returns `false` if already present.
    pub fn add_student(&mut self, student_id: UserId) -> bool {
        self.students.insert(student_id)
    }

    /// Remove from the student set. Returns `false` if absent.
    pub fn remove_student(&mut self, student_id: UserId) -> bool {
        self.students.remove(&student_id)
    }

    fn lessons_changed(&mut self, now: DateTime<Utc>) {
        // Stable sort keeps insertion order among equal `order` values.
        self.lessons.sort_by_key(|l| l.order);
        self.total_duration = total_duration(&self.lessons);
        self.updated_at = now;
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn check_title(v: &mut Validator, title: &str) {
    v.check(trimmed_len(title) >= 1, "title", "Title is required");
}

fn check_description(v: &mut Validator, description: &str) {
    v.check(
        trimmed_len(description) >= 10,
        "description",
        "Description must be at least 10 characters",
    );
}

fn check_short_description(v: &mut Validator, short: &str) {
    let len = trimmed_len(short);
    v.check(
        (10..=SHORT_DESCRIPTION_MAX).contains(&len),
        "shortDescription",
        "Short description must be 10-200 characters",
    );
}

fn check_price(v: &mut Validator, price: f64) {
    v.check(
        price.is_finite() && price >= 0.0,
        "price",
        "Price must be a non-negative number",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_course() -> NewCourse {
        NewCourse {
            title: "Complete Web Development Bootcamp".to_string(),
            description: "Learn full-stack web development from scratch.".to_string(),
            short_description: "Master HTML, CSS, JavaScript and Node.js".to_string(),
            category: Category::Programming,
            level: Level::Beginner,
            price: 89.99,
            thumbnail: String::new(),
            tags: vec![" web ".to_string(), "".to_string(), "javascript".to_string()],
            is_published: true,
        }
    }

    fn lesson(order: i32, minutes: u32) -> NewLesson {
        NewLesson {
            title: format!("Lesson {order}"),
            description: "Lesson content".to_string(),
            video_url: format!("https://example.com/video{order}"),
            duration_minutes: minutes,
            order,
            is_preview: order == 1,
        }
    }

    fn course() -> Course {
        Course::create(CourseId::new(), UserId::new(), new_course(), Utc::now()).unwrap()
    }

    #[test]
    fn create_starts_empty_and_normalizes_tags() {
        let c = course();
        assert_eq!(c.total_duration(), 0);
        assert_eq!(c.lesson_count(), 0);
        assert!(c.students().is_empty());
        assert_eq!(c.tags(), ["web".to_string(), "javascript".to_string()]);
    }

    #[test]
    fn create_rejects_invalid_fields() {
        let input = NewCourse {
            title: "".to_string(),
            short_description: "x".repeat(201),
            price: -1.0,
            ..new_course()
        };
        let err = Course::create(CourseId::new(), UserId::new(), input, Utc::now()).unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.clone()).collect();
        assert_eq!(fields, vec!["title", "shortDescription", "price"]);
    }

    #[test]
    fn rejects_nan_price() {
        let input = NewCourse {
            price: f64::NAN,
            ..new_course()
        };
        assert!(Course::create(CourseId::new(), UserId::new(), input, Utc::now()).is_err());
    }

    #[test]
    fn five_lessons_total_390_minutes() {
        let mut c = course();
        for (i, minutes) in [45, 60, 75, 90, 120].into_iter().enumerate() {
            c.add_lesson(lesson(i as i32 + 1, minutes), Utc::now()).unwrap();
        }
        assert_eq!(c.total_duration(), 390);
        assert_eq!(c.lesson_count(), 5);
    }

    #[test]
    fn edit_and_remove_recompute_duration() {
        let mut c = course();
        let a = c.add_lesson(lesson(1, 30), Utc::now()).unwrap();
        let b = c.add_lesson(lesson(2, 40), Utc::now()).unwrap();
        assert_eq!(c.total_duration(), 70);

        let patch = LessonPatch {
            duration_minutes: Some(50),
            ..LessonPatch::default()
        };
        c.update_lesson(a, patch, Utc::now()).unwrap();
        assert_eq!(c.total_duration(), 90);

        c.remove_lesson(b, Utc::now()).unwrap();
        assert_eq!(c.total_duration(), 50);
    }

    #[test]
    fn invalid_lesson_leaves_course_unchanged() {
        let mut c = course();
        c.add_lesson(lesson(1, 30), Utc::now()).unwrap();
        let before = c.clone();

        assert!(c.add_lesson(lesson(2, 0), Utc::now()).is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn unknown_lesson_is_not_found() {
        let mut c = course();
        let err = c.remove_lesson(LessonId::new(), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::NotFound("lesson"));
    }

    #[test]
    fn lessons_are_kept_in_order() {
        let mut c = course();
        c.add_lesson(lesson(3, 10), Utc::now()).unwrap();
        c.add_lesson(lesson(1, 10), Utc::now()).unwrap();
        c.add_lesson(lesson(2, 10), Utc::now()).unwrap();
        let orders: Vec<_> = c.lessons().iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn student_set_is_idempotent() {
        let mut c = course();
        let s = UserId::new();
        assert!(c.add_student(s));
        assert!(!c.add_student(s));
        assert_eq!(c.students().len(), 1);
        assert!(c.remove_student(s));
        assert!(!c.remove_student(s));
    }

    #[test]
    fn patch_can_unpublish() {
        let mut c = course();
        let patch = CoursePatch {
            is_published: Some(false),
            price: Some(0.0),
            ..CoursePatch::default()
        };
        c.apply_patch(patch, Utc::now()).unwrap();
        assert!(!c.is_published());
        assert_eq!(c.price(), 0.0);
    }

    #[test]
    fn rejected_patch_changes_nothing() {
        let mut c = course();
        let before = c.clone();
        let patch = CoursePatch {
            title: Some("New title".to_string()),
            description: Some("short".to_string()),
            ..CoursePatch::default()
        };
        assert!(c.apply_patch(patch, Utc::now()).is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn category_and_level_parse_wire_names() {
        assert_eq!("data-science".parse::<Category>().unwrap(), Category::DataScience);
        assert_eq!("advanced".parse::<Level>().unwrap(), Level::Advanced);
        assert!("cooking".parse::<Category>().is_err());
        assert_eq!(
            serde_json::to_string(&Category::DataScience).unwrap(),
            "\"data-science\""
        );
    }

    #[test]
    fn rating_bounds() {
        let rating = Rating::new(4.8, 567).unwrap();
        assert_eq!((rating.average(), rating.count()), (4.8, 567));
        assert!(Rating::new(5.1, 1).is_err());
        assert!(Rating::new(f64::NAN, 1).is_err());
        assert!(Rating::new(-0.1, 1).is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u32, i32),
            Edit(usize, u32),
            Remove(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..600, -5i32..50).prop_map(|(m, o)| Op::Add(m, o)),
                (0usize..20, 1u32..600).prop_map(|(i, m)| Op::Edit(i, m)),
                (0usize..20).prop_map(Op::Remove),
            ]
        }

        proptest! {
            /// Property: total duration always equals the sum of current lessons.
            #[test]
            fn total_duration_tracks_lessons(ops in proptest::collection::vec(op(), 0..40)) {
                let mut c = course();
                for op in ops {
                    match op {
                        Op::Add(minutes, order) => {
                            c.add_lesson(lesson(order, minutes), Utc::now()).unwrap();
                        }
                        Op::Edit(idx, minutes) => {
                            if let Some(id) = c.lessons().get(idx).map(|l| l.id) {
                                let patch = LessonPatch {
                                    duration_minutes: Some(minutes),
                                    ..LessonPatch::default()
                                };
                                c.update_lesson(id, patch, Utc::now()).unwrap();
                            }
                        }
                        Op::Remove(idx) => {
                            if let Some(id) = c.lessons().get(idx).map(|l| l.id) {
                                c.remove_lesson(id, Utc::now()).unwrap();
                            }
                        }
                    }
                    let expected: u64 = c.lessons().iter().map(|l| u64::from(l.duration_minutes)).sum();
                    prop_assert_eq!(c.total_duration(), expected);
                }
            }
        }
    }
}
