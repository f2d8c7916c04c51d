use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eduhub_core::validation::{is_http_url, trimmed_len};
use eduhub_core::{DomainResult, Entity, LessonId, Validator};

/// A lesson inside a course.
///
/// Lessons are only created and changed through their owning [`crate::Course`],
/// which keeps the course's total duration in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub description: String,
    pub video_url: String,
    /// Length in minutes, always > 0.
    pub duration_minutes: u32,
    /// Position within the course. Not required unique.
    pub order: i32,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Lesson {
    type Id = LessonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for adding a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLesson {
    pub title: String,
    pub description: String,
    pub video_url: String,
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
    pub order: i32,
    #[serde(default)]
    pub is_preview: bool,
}

impl NewLesson {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        check_title(&mut v, &self.title);
        check_description(&mut v, &self.description);
        check_video_url(&mut v, &self.video_url);
        check_duration(&mut v, self.duration_minutes);
        v.finish()
    }

    /// Validate and materialize the lesson with a fresh id.
    pub fn into_lesson(self, now: DateTime<Utc>) -> DomainResult<Lesson> {
        self.validate()?;
        Ok(Lesson {
            id: LessonId::new(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            video_url: self.video_url.trim().to_string(),
            duration_minutes: self.duration_minutes,
            order: self.order,
            is_preview: self.is_preview,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial edit of a lesson; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    #[serde(alias = "duration")]
    pub duration_minutes: Option<u32>,
    pub order: Option<i32>,
    pub is_preview: Option<bool>,
}

impl LessonPatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            check_title(&mut v, title);
        }
        if let Some(description) = &self.description {
            check_description(&mut v, description);
        }
        if let Some(url) = &self.video_url {
            check_video_url(&mut v, url);
        }
        if let Some(minutes) = self.duration_minutes {
            check_duration(&mut v, minutes);
        }
        v.finish()
    }

    /// Apply an already validated patch.
    pub(crate) fn apply_to(self, lesson: &mut Lesson, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            lesson.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            lesson.description = description.trim().to_string();
        }
        if let Some(url) = self.video_url {
            lesson.video_url = url.trim().to_string();
        }
        if let Some(minutes) = self.duration_minutes {
            lesson.duration_minutes = minutes;
        }
        if let Some(order) = self.order {
            lesson.order = order;
        }
        if let Some(is_preview) = self.is_preview {
            lesson.is_preview = is_preview;
        }
        lesson.updated_at = now;
    }
}

fn check_title(v: &mut Validator, title: &str) {
    v.check(trimmed_len(title) >= 1, "title", "Title is required");
}

fn check_description(v: &mut Validator, description: &str) {
    v.check(
        trimmed_len(description) >= 5,
        "description",
        "Description must be at least 5 characters",
    );
}

fn check_video_url(v: &mut Validator, url: &str) {
    v.check(is_http_url(url), "videoUrl", "Valid video URL is required");
}

fn check_duration(v: &mut Validator, minutes: u32) {
    v.check(minutes > 0, "durationMinutes", "Duration must be greater than 0");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewLesson {
        NewLesson {
            title: "  Intro to Rust ".to_string(),
            description: "Ownership and borrowing".to_string(),
            video_url: "https://example.com/video1".to_string(),
            duration_minutes: 45,
            order: 1,
            is_preview: true,
        }
    }

    #[test]
    fn materializes_trimmed_lesson() {
        let now = Utc::now();
        let lesson = valid().into_lesson(now).unwrap();
        assert_eq!(lesson.title, "Intro to Rust");
        assert_eq!(lesson.duration_minutes, 45);
        assert_eq!(lesson.created_at, now);
        assert!(lesson.is_preview);
    }

    #[test]
    fn reports_every_invalid_field() {
        let input = NewLesson {
            title: " ".to_string(),
            description: "abc".to_string(),
            video_url: "not a url".to_string(),
            duration_minutes: 0,
            ..valid()
        };

        let err = input.into_lesson(Utc::now()).unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.clone()).collect();
        assert_eq!(fields, vec!["title", "description", "videoUrl", "durationMinutes"]);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let now = Utc::now();
        let mut lesson = valid().into_lesson(now).unwrap();
        let patch = LessonPatch {
            duration_minutes: Some(60),
            ..LessonPatch::default()
        };
        patch.validate().unwrap();
        patch.apply_to(&mut lesson, now);

        assert_eq!(lesson.duration_minutes, 60);
        assert_eq!(lesson.title, "Intro to Rust");
    }

    #[test]
    fn patch_rejects_zero_duration() {
        let patch = LessonPatch {
            duration_minutes: Some(0),
            ..LessonPatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn deserializes_camel_case_with_default_preview() {
        let input: NewLesson = serde_json::from_value(serde_json::json!({
            "title": "Setup",
            "description": "Install the toolchain",
            "videoUrl": "https://example.com/setup",
            "durationMinutes": 15,
            "order": 0
        }))
        .unwrap();
        assert!(!input.is_preview);
        assert_eq!(input.duration_minutes, 15);
    }
}
