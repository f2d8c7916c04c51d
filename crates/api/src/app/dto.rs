use std::str::FromStr;

use serde::{Deserialize, Serialize};

use eduhub_catalog::{Category, CourseFilter, CoursePatch, Level, NewCourse, Page, PageRequest};
use eduhub_core::{DomainError, DomainResult, FieldError};
use eduhub_infra::services::CourseView;
use eduhub_learning::{NewUser, ProfilePatch};

use crate::app::services::Paging;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub level: String,
    pub price: Option<f64>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_published: Option<bool>,
}

impl CreateCourseRequest {
    /// Domain input plus the explicit publish flag, if the client sent one.
    pub fn into_domain(self) -> DomainResult<(NewCourse, Option<bool>)> {
        let mut errors = Vec::new();
        let category = parse_field::<Category>(&self.category, &mut errors);
        let level = parse_field::<Level>(&self.level, &mut errors);
        if self.price.is_none() {
            errors.push(FieldError::new("price", "Price must be a number"));
        }

        let (Some(category), Some(level), Some(price)) = (category, level, self.price) else {
            return Err(DomainError::Validation(errors));
        };

        let input = NewCourse {
            title: self.title,
            description: self.description,
            short_description: self.short_description,
            category,
            level,
            price,
            thumbnail: self.thumbnail,
            tags: self.tags,
            is_published: false,
        };
        Ok((input, self.is_published))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price: Option<f64>,
    pub thumbnail: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

impl UpdateCourseRequest {
    pub fn into_domain(self) -> DomainResult<CoursePatch> {
        let mut errors = Vec::new();
        let category = self
            .category
            .as_deref()
            .and_then(|raw| parse_field::<Category>(raw, &mut errors));
        let level = self
            .level
            .as_deref()
            .and_then(|raw| parse_field::<Level>(raw, &mut errors));
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        Ok(CoursePatch {
            title: self.title,
            description: self.description,
            short_description: self.short_description,
            category,
            level,
            price: self.price,
            thumbnail: self.thumbnail,
            tags: self.tags,
            is_published: self.is_published,
        })
    }
}

/// Query string of `GET /courses`. Empty values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListCoursesQuery {
    pub category: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListCoursesQuery {
    pub fn into_domain(self, paging: Paging) -> DomainResult<(CourseFilter, PageRequest)> {
        let mut errors = Vec::new();
        let category = non_empty(self.category)
            .and_then(|raw| parse_field::<Category>(&raw, &mut errors));
        let level = non_empty(self.level).and_then(|raw| parse_field::<Level>(&raw, &mut errors));
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let limit = self
            .limit
            .unwrap_or(paging.default_limit)
            .min(paging.max_limit);
        let request = PageRequest::new(self.page.unwrap_or(1), limit)?;

        let filter = CourseFilter {
            category,
            level,
            search: non_empty(self.search),
        };
        Ok((filter, request))
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(value: RegisterRequest) -> Self {
        NewUser {
            name: value.name,
            email: value.email,
            bio: value.bio,
            avatar: value.avatar,
        }
    }
}

/// Only name, bio and avatar are accepted; other fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl From<UpdateProfileRequest> for ProfilePatch {
    fn from(value: UpdateProfileRequest) -> Self {
        ProfilePatch {
            name: value.name,
            bio: value.bio,
            avatar: value.avatar,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseListResponse {
    pub courses: Vec<CourseView>,
    pub total_pages: usize,
    pub current_page: u32,
    pub total: usize,
}

impl From<Page<CourseView>> for CourseListResponse {
    fn from(page: Page<CourseView>) -> Self {
        Self {
            courses: page.items,
            total_pages: page.total_pages,
            current_page: page.current_page,
            total: page.total,
        }
    }
}

fn parse_field<T>(raw: &str, errors: &mut Vec<FieldError>) -> Option<T>
where
    T: FromStr<Err = DomainError>,
{
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            errors.extend(err.field_errors().iter().cloned());
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGING: Paging = Paging {
        default_limit: 10,
        max_limit: 100,
    };

    fn create_request() -> CreateCourseRequest {
        CreateCourseRequest {
            title: "Complete React Development Bootcamp".to_string(),
            description: "Master React from basics to advanced concepts".to_string(),
            short_description: "Learn React from scratch".to_string(),
            category: "programming".to_string(),
            level: "beginner".to_string(),
            price: Some(99.99),
            thumbnail: String::new(),
            tags: vec!["react".to_string()],
            is_published: None,
        }
    }

    #[test]
    fn create_request_maps_enums() {
        let (input, publish) = create_request().into_domain().unwrap();
        assert_eq!(input.category, Category::Programming);
        assert_eq!(input.level, Level::Beginner);
        assert_eq!(publish, None);
    }

    #[test]
    fn create_request_reports_every_bad_field() {
        let req = CreateCourseRequest {
            category: "cooking".to_string(),
            level: "expert".to_string(),
            price: None,
            ..create_request()
        };
        let err = req.into_domain().unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["category", "level", "price"]);
    }

    #[test]
    fn create_request_accepts_camel_case_json() {
        let req: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "UI/UX Design Masterclass",
            "shortDescription": "Become a professional designer",
            "category": "design",
            "level": "intermediate",
            "price": 89.99,
            "isPublished": false
        }))
        .unwrap();
        assert_eq!(req.short_description, "Become a professional designer");
        assert_eq!(req.is_published, Some(false));
    }

    #[test]
    fn list_query_applies_default_and_cap() {
        let (_, request) = ListCoursesQuery::default().into_domain(PAGING).unwrap();
        assert_eq!((request.page(), request.limit()), (1, 10));

        let query = ListCoursesQuery {
            limit: Some(1000),
            page: Some(3),
            ..ListCoursesQuery::default()
        };
        let (_, request) = query.into_domain(PAGING).unwrap();
        assert_eq!((request.page(), request.limit()), (3, 100));
    }

    #[test]
    fn list_query_ignores_empty_values_and_rejects_unknown_category() {
        let query = ListCoursesQuery {
            category: Some(String::new()),
            search: Some("  ".to_string()),
            ..ListCoursesQuery::default()
        };
        let (filter, _) = query.into_domain(PAGING).unwrap();
        assert_eq!(filter, CourseFilter::default());

        let query = ListCoursesQuery {
            category: Some("cooking".to_string()),
            ..ListCoursesQuery::default()
        };
        assert!(query.into_domain(PAGING).is_err());
    }

    #[test]
    fn zero_page_is_rejected() {
        let query = ListCoursesQuery {
            page: Some(0),
            ..ListCoursesQuery::default()
        };
        assert_eq!(query.into_domain(PAGING).unwrap_err().field_errors()[0].field, "page");
    }
}
