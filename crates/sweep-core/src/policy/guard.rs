//! Account and region validation for invocations.
//!
//! Pure function of the invocation and its static policy parameters.

use tracing::{debug, warn};

use crate::invocation::Invocation;
use crate::policy::errors::PolicyViolation;

/// Check an invocation against the blocklist and region allow-list.
///
/// Rules run in order and the first violation is returned: blank
/// account, blocklisted account, then a region outside the allow-list
/// (a blank entry included), then an empty region list.
pub fn validate(invocation: &Invocation) -> Result<(), PolicyViolation> {
    let result = check(invocation);

    match &result {
        Ok(()) => debug!(
            event = "core.policy.validate_completed",
            account_id = %invocation.account_id(),
            regions = ?invocation.regions(),
        ),
        Err(violation) => warn!(
            event = "core.policy.validate_failed",
            account_id = %invocation.account_id(),
            violation = violation.kind(),
            error = %violation,
        ),
    }

    result
}

fn check(invocation: &Invocation) -> Result<(), PolicyViolation> {
    let policy = invocation.policy();

    if invocation.account_id().is_empty() {
        return Err(PolicyViolation::MissingAccount);
    }

    if policy.is_blocked(invocation.account_id()) {
        return Err(PolicyViolation::BlockedAccount {
            account_id: invocation.account_id().to_string(),
        });
    }

    if let Some(region) = invocation
        .regions()
        .iter()
        .find(|region| !policy.is_region_allowed(region))
    {
        return Err(PolicyViolation::RegionNotAllowed {
            region: region.clone(),
            allowed: policy.allowed_regions.clone(),
        });
    }

    if invocation.regions().is_empty() {
        return Err(PolicyViolation::NoRegionsSpecified);
    }

    Ok(())
}
