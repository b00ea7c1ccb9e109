use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

use crate::artifacts::{ArtifactStore, PLAN_PREFIX, key_timestamp};
use crate::plan::document::NukePlanDocument;
use crate::plan::errors::GenerationError;
use crate::plan::traits::ConfigGenerator;
use crate::plan::types::{PlanArtifact, PlanRequest};

/// Renders plans as YAML and writes them to an artifact store.
pub struct NukePlanGenerator {
    store: Arc<dyn ArtifactStore>,
    cdk_bucket_prefix: String,
}

impl NukePlanGenerator {
    pub fn new(store: Arc<dyn ArtifactStore>, cdk_bucket_prefix: impl Into<String>) -> Self {
        Self {
            store,
            cdk_bucket_prefix: cdk_bucket_prefix.into(),
        }
    }
}

#[async_trait]
impl ConfigGenerator for NukePlanGenerator {
    async fn generate(&self, request: &PlanRequest) -> Result<PlanArtifact, GenerationError> {
        info!(
            event = "core.plan.generate_started",
            account_id = %request.account_id,
            regions = ?request.regions,
            project_name = %request.project_name,
        );

        let document =
            NukePlanDocument::build(request, self.store.bucket(), &self.cdk_bucket_prefix);
        let body = document.to_yaml()?;

        let key = format!(
            "{}/nuke-config-{}-{}.yaml",
            PLAN_PREFIX,
            key_timestamp(),
            request.run_id
        );
        let uri = self.store.put(&key, &body).await.map_err(|e| {
            error!(
                event = "core.plan.generate_failed",
                key = %key,
                error = %e,
            );
            GenerationError::from(e)
        })?;

        info!(
            event = "core.plan.generate_completed",
            account_id = %request.account_id,
            uri = %uri,
        );

        Ok(PlanArtifact {
            key,
            uri,
            account_id: request.account_id.clone(),
            regions: request.regions.clone(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::LocalArtifactStore;
    use crate::invocation::ProtectionTag;

    fn request() -> PlanRequest {
        PlanRequest {
            run_id: "run-1".to_string(),
            account_id: "111".to_string(),
            regions: vec!["eu-west-1".to_string(), "eu-west-2".to_string()],
            protection_tag: ProtectionTag::new("Cleanup", "persist"),
            blocklist_accounts: Vec::new(),
            project_name: "aws-nuke".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_stores_plan_under_configs_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalArtifactStore::new(dir.path(), "plans"));
        let generator = NukePlanGenerator::new(store.clone(), "cdk-");

        let plan = generator.generate(&request()).await.unwrap();
        assert!(plan.key.starts_with("nuke-configs/nuke-config-"));
        assert!(plan.key.ends_with(".yaml"));
        assert_eq!(plan.account_id, "111");
        assert_eq!(plan.regions.len(), 2);

        let body = store.get(&plan.uri).await.unwrap();
        let doc: NukePlanDocument = serde_yaml::from_str(&body).unwrap();
        assert_eq!(doc.regions, plan.regions);
        assert!(doc.accounts.contains_key("111"));
    }

    #[tokio::test]
    async fn test_generate_with_empty_blocklist_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalArtifactStore::new(dir.path(), "plans"));
        let generator = NukePlanGenerator::new(store.clone(), "cdk-");

        let plan = generator.generate(&request()).await.unwrap();
        let doc: NukePlanDocument =
            serde_yaml::from_str(&store.get(&plan.uri).await.unwrap()).unwrap();
        assert!(doc.blocklist.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_runs_get_separate_plans() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalArtifactStore::new(dir.path(), "plans"));
        let generator = NukePlanGenerator::new(store.clone(), "cdk-");

        let first = PlanRequest {
            run_id: "run-a".to_string(),
            account_id: "111".to_string(),
            regions: vec!["eu-west-1".to_string()],
            ..request()
        };
        let second = PlanRequest {
            run_id: "run-b".to_string(),
            account_id: "222".to_string(),
            regions: vec!["eu-west-2".to_string()],
            ..request()
        };

        let (a, b) = tokio::join!(generator.generate(&first), generator.generate(&second));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.uri, b.uri);
        assert!(a.key.ends_with("-run-a.yaml"));

        let doc_a: NukePlanDocument =
            serde_yaml::from_str(&store.get(&a.uri).await.unwrap()).unwrap();
        let doc_b: NukePlanDocument =
            serde_yaml::from_str(&store.get(&b.uri).await.unwrap()).unwrap();
        assert!(doc_a.accounts.contains_key("111"));
        assert!(!doc_a.accounts.contains_key("222"));
        assert_eq!(doc_a.regions, ["eu-west-1"]);
        assert!(doc_b.accounts.contains_key("222"));
        assert_eq!(doc_b.regions, ["eu-west-2"]);
    }
}
