use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactUri;
use crate::executor::ResourceDescriptor;
use crate::invocation::ProtectionTag;

/// Listed resources in a message body; the report holds the rest.
const MAX_LISTED_RESOURCES: usize = 50;

/// Everything the notifier is told about a finished execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub execution_id: String,
    pub account_id: String,
    pub regions: Vec<String>,
    pub outcome_summary: String,
    pub output_location: Option<ArtifactUri>,
    pub resources_to_delete: Vec<ResourceDescriptor>,
    pub success: bool,
    pub dry_run: bool,
    pub error: Option<String>,
    pub protection_tag: ProtectionTag,
}

/// Rendered, transport-independent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

/// Proof of delivery returned by a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub backend: String,
    pub message_id: String,
}

impl NotificationMessage {
    pub fn render(request: &NotificationRequest) -> Self {
        let count = request.resources_to_delete.len();
        let location = request
            .output_location
            .as_ref()
            .map_or_else(|| "No output file available".to_string(), |uri| uri.to_string());

        if !request.success {
            return Self::render_failure(request, &location);
        }

        let mut body = String::new();
        if request.dry_run {
            let _ = writeln!(body, "DRY-RUN Results - APPROVAL REQUIRED\n");
            let _ = writeln!(body, "Execution ID: {}", request.execution_id);
            let _ = writeln!(body, "Account: {}", request.account_id);
            let _ = writeln!(body, "Regions: {}", request.regions.join(", "));
            let _ = writeln!(body, "Type: DRY-RUN (no resources were deleted)\n");
            let _ = writeln!(body, "Summary:");
            let _ = writeln!(body, "- Resources that WOULD BE DELETED: {}\n", count);
            write_resources(&mut body, &request.resources_to_delete);
            let _ = writeln!(body, "Dry-run report: {}\n", location);
            let _ = writeln!(body, "SAFETY CHECK - before approving, verify that:");
            let _ = writeln!(body, "- No critical resources are listed for deletion");
            let _ = writeln!(body, "- The sweep's own infrastructure is NOT in the list");
            let _ = writeln!(body, "- CDK bootstrap resources are protected");
            let _ = writeln!(
                body,
                "- All important resources carry the '{}: {}' tag\n",
                request.protection_tag.key, request.protection_tag.value
            );
            let _ = writeln!(body, "TO APPROVE, start a new run that performs the deletion:");
            let region_flags: String = request
                .regions
                .iter()
                .map(|r| format!(" --region {}", r))
                .collect();
            let _ = writeln!(
                body,
                "  sweep run --account {}{} --no-dry-run\n",
                request.account_id, region_flags
            );
            let _ = writeln!(body, "TO REJECT, do nothing. No resources will be deleted.");

            Self {
                subject: format!(
                    "DRY-RUN Results - {} resources found - APPROVAL REQUIRED",
                    count
                ),
                body,
            }
        } else {
            let _ = writeln!(body, "Execution Complete\n");
            let _ = writeln!(body, "Execution ID: {}", request.execution_id);
            let _ = writeln!(body, "Account: {}", request.account_id);
            let _ = writeln!(body, "Regions: {}\n", request.regions.join(", "));
            let _ = writeln!(body, "Summary:");
            let _ = writeln!(body, "- Resources Processed: {}\n", count);
            write_resources(&mut body, &request.resources_to_delete);
            let _ = writeln!(body, "Full output: {}", location);

            Self {
                subject: format!("Execution Complete - {} resources processed", count),
                body,
            }
        }
    }

    fn render_failure(request: &NotificationRequest, location: &str) -> Self {
        let mode = if request.dry_run { "DRY-RUN" } else { "EXECUTION" };
        let mut body = String::new();
        let _ = writeln!(body, "{} FAILED\n", mode);
        let _ = writeln!(body, "Execution ID: {}", request.execution_id);
        let _ = writeln!(body, "Account: {}", request.account_id);
        let _ = writeln!(
            body,
            "Error: {}",
            request.error.as_deref().unwrap_or("unknown error")
        );
        let _ = writeln!(body, "Report: {}", location);
        if !request.dry_run {
            let _ = writeln!(
                body,
                "\nSome resources may already have been deleted. Deletions are not rolled back."
            );
        }

        Self {
            subject: format!("{} FAILED - {}", mode, request.outcome_summary),
            body,
        }
    }
}

fn write_resources(body: &mut String, resources: &[ResourceDescriptor]) {
    if resources.is_empty() {
        return;
    }
    for resource in resources.iter().take(MAX_LISTED_RESOURCES) {
        if resource.resource_type.is_empty() {
            let _ = writeln!(body, "  {}", resource.identifier);
        } else {
            let _ = writeln!(
                body,
                "  {} {} {}",
                resource.region, resource.resource_type, resource.identifier
            );
        }
    }
    if resources.len() > MAX_LISTED_RESOURCES {
        let _ = writeln!(
            body,
            "  ... and {} more (see report)",
            resources.len() - MAX_LISTED_RESOURCES
        );
    }
    body.push('\n');
}
