use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
#[error("Lookup '{list}' failed: {message}")]
pub struct LookupError {
    pub list: &'static str,
    pub message: String,
}

/// Source of the dropdown option lists.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn fetch_degrees(&self) -> Result<Vec<String>, LookupError>;
    async fn fetch_job_positions(&self) -> Result<Vec<String>, LookupError>;
}

/// Option lists fetched once per form mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookups {
    pub degrees: Vec<String>,
    pub job_positions: Vec<String>,
}

impl Lookups {
    /// Fetches both lists. A failed fetch is logged and leaves that list empty.
    pub async fn load(service: &dyn LookupService) -> Self {
        let degrees = service.fetch_degrees().await.unwrap_or_else(|e| {
            warn!("{e}; degree list left empty");
            Vec::new()
        });
        let job_positions = service.fetch_job_positions().await.unwrap_or_else(|e| {
            warn!("{e}; job position list left empty");
            Vec::new()
        });

        info!(
            "Loaded lookups: {} degrees, {} job positions",
            degrees.len(),
            job_positions.len()
        );

        Self {
            degrees,
            job_positions,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeLookups;
    use super::*;

    #[tokio::test]
    async fn test_load_both_lists() {
        let lookups = Lookups::load(&FakeLookups::standard()).await;
        assert_eq!(lookups.degrees, vec!["B.Tech", "MBA"]);
        assert_eq!(lookups.job_positions.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_empty_list() {
        let service = FakeLookups {
            degrees: None,
            job_positions: Some(vec!["Recruiter".to_string()]),
        };
        let lookups = Lookups::load(&service).await;
        assert!(lookups.degrees.is_empty());
        assert_eq!(lookups.job_positions, vec!["Recruiter"]);
    }
}
