//! Recording fakes of the three collaborators.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sweep_config::SweepConfig;

use crate::artifacts::{ArtifactError, ArtifactUri};
use crate::executor::{
    ExecutionError, ExecutionRequest, ExecutionResult, Executor, ExecutorError, ResourceDescriptor,
};
use crate::invocation::{Invocation, InvocationRequest, PolicyParams};
use crate::notify::{DeliveryError, DeliveryReceipt, NotificationRequest, Notifier};
use crate::plan::{ConfigGenerator, GenerationError, PlanArtifact, PlanRequest};

pub fn policy() -> Arc<PolicyParams> {
    Arc::new(PolicyParams::from_config(&SweepConfig {
        allowed_regions: vec!["eu-west-1".to_string(), "eu-west-2".to_string()],
        blocklist_accounts: vec!["999".to_string()],
        ..Default::default()
    }))
}

pub fn manual(account_id: &str, regions: &[&str], dry_run: bool, notify: bool) -> Invocation {
    Invocation::manual(
        InvocationRequest {
            account_id: account_id.to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            dry_run,
            send_notification: notify,
            scheduled: None,
        },
        policy(),
    )
}

pub fn resource(id: &str, tags: &[(&str, &str)]) -> ResourceDescriptor {
    ResourceDescriptor {
        region: "eu-west-1".to_string(),
        resource_type: "EC2Instance".to_string(),
        identifier: id.to_string(),
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        properties: BTreeMap::new(),
        state: "would remove".to_string(),
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FakeGenerator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigGenerator for FakeGenerator {
    async fn generate(&self, request: &PlanRequest) -> Result<PlanArtifact, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenerationError::StorageFailed {
                source: ArtifactError::NotFound {
                    uri: "mem://bucket".to_string(),
                },
            });
        }
        Ok(PlanArtifact {
            key: "nuke-configs/nuke-config-test.yaml".to_string(),
            uri: ArtifactUri::new("mem://bucket/nuke-configs/nuke-config-test.yaml"),
            account_id: request.account_id.clone(),
            regions: request.regions.clone(),
            created_at: Utc::now(),
        })
    }
}

pub enum ExecutorBehavior {
    Succeed(Vec<ResourceDescriptor>),
    Fail(ExecutionError),
    Mismatch,
    Hang,
}

pub struct FakeExecutor {
    pub calls: AtomicUsize,
    pub behavior: ExecutorBehavior,
    pub last: Mutex<Option<ExecutionRequest>>,
}

impl FakeExecutor {
    pub fn new(behavior: ExecutorBehavior) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            behavior,
            last: Mutex::new(None),
        }
    }

    pub fn succeeding(count: usize) -> Self {
        Self::new(ExecutorBehavior::Succeed(
            (0..count).map(|i| resource(&format!("i-{}", i), &[])).collect(),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ExecutionRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        match &self.behavior {
            ExecutorBehavior::Succeed(resources) => Ok(ExecutionResult::succeeded(
                request.dry_run,
                resources.clone(),
                Some(ArtifactUri::new("mem://bucket/nuke-outputs/report.txt")),
            )),
            ExecutorBehavior::Fail(error) => {
                Ok(ExecutionResult::failed(request.dry_run, error.clone(), None))
            }
            ExecutorBehavior::Mismatch => Err(ExecutorError::VersionMismatch {
                expected: request.tool_version.clone(),
                actual: "v0.0.1".to_string(),
            }),
            ExecutorBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(ExecutionResult::succeeded(request.dry_run, Vec::new(), None))
            }
        }
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub last: Mutex<Option<NotificationRequest>>,
}

impl FakeNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<NotificationRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        if self.fail {
            return Err(DeliveryError::NoTransport);
        }
        Ok(DeliveryReceipt {
            backend: "fake".to_string(),
            message_id: "msg-1".to_string(),
        })
    }
}
