use eduhub_core::{DomainError, DomainResult};
use eduhub_infra::AppConfig;
use eduhub_infra::seed::seed_demo_data;
use eduhub_infra::services::{ServiceSettings, Services};

use crate::app::errors::ApiError;

/// Limits applied to `GET /courses` paging.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Paging {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl From<&AppConfig> for Paging {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_limit: config.default_page_size,
            max_limit: config.max_page_size,
        }
    }
}

/// Everything a handler needs, shared through an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub domain: Services,
    pub paging: Paging,
}

/// In-memory stores plus services; seeds demo data when configured.
pub fn build_services(config: &AppConfig) -> DomainResult<AppServices> {
    let domain = Services::in_memory(ServiceSettings::from(config));

    if config.seed_demo_data {
        let summary = seed_demo_data(&domain)?;
        tracing::info!(
            courses = summary.courses,
            enrollments = summary.enrollments,
            "demo data seeded"
        );
    }

    Ok(AppServices {
        domain,
        paging: Paging::from(config),
    })
}

/// Run a synchronous service call on the blocking pool.
///
/// Services take std locks and retry in a loop; they never run on an async
/// worker thread. A panicking call surfaces as a storage error.
pub async fn run_blocking<T, F>(call: F) -> Result<T, ApiError>
where
    F: FnOnce() -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(call).await.map_err(|e| {
        tracing::error!(error = %e, "service call did not complete");
        DomainError::Storage(format!("service call did not complete: {e}"))
    })?;
    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_results_and_domain_errors_through() {
        assert_eq!(run_blocking(|| Ok(7)).await.unwrap(), 7);

        let err = run_blocking::<(), _>(|| Err(DomainError::AlreadyEnrolled))
            .await
            .unwrap_err();
        assert_eq!(err.0, DomainError::AlreadyEnrolled);
    }

    #[tokio::test]
    async fn panicking_call_becomes_storage_error() {
        let err = run_blocking::<(), _>(|| panic!("lock poisoned"))
            .await
            .unwrap_err();
        assert!(matches!(err.0, DomainError::Storage(_)));
    }
}
