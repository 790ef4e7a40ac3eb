//! The find-and-replace request/response contract.
//!
//! A request moves through `Received -> Planned -> {Denied | Applied} -> Completed`.
//! Nothing survives between requests: the engine only holds its configuration.

use crate::buffer::{ResourceBuffer, hex_digest};
use crate::config::BytepatchConfig;
use crate::error::{FindReplaceError, MutationError};
use crate::mutator::ResourceMutator;
use crate::observer::{ChangeObserver, ResourceChanged};
use crate::pattern::TextEncoding;
use crate::planner::{ReplacementPlan, ReplacementPlanner, ZeroMatchPolicy};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, info_span, warn};

fn default_null_terminate() -> bool {
    true
}

/// One find-and-replace request as supplied by the presentation layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FindReplaceRequest {
    pub find_text: String,
    #[serde(default)]
    pub replace_text: String,
    #[serde(default = "default_null_terminate")]
    pub null_terminate: bool,
    #[serde(default)]
    pub allow_overflow: bool,
}

impl FindReplaceRequest {
    /// A request with the default policies: null-terminated, no overflow.
    pub fn new(find_text: impl Into<String>, replace_text: impl Into<String>) -> Self {
        Self {
            find_text: find_text.into(),
            replace_text: replace_text.into(),
            null_terminate: default_null_terminate(),
            allow_overflow: false,
        }
    }

    pub fn null_terminate(mut self, null_terminate: bool) -> Self {
        self.null_terminate = null_terminate;
        self
    }

    pub fn allow_overflow(mut self, allow_overflow: bool) -> Self {
        self.allow_overflow = allow_overflow;
        self
    }
}

/// Successful result of a request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FindReplaceOutcome {
    pub resource_id: String,
    pub occurrences: usize,
    /// `false` when nothing matched and the resource was left alone.
    pub changed: bool,
    pub old_len: usize,
    pub new_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Planned,
    Denied,
    Applied,
    Completed,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Received => "received",
            RequestState::Planned => "planned",
            RequestState::Denied => "denied",
            RequestState::Applied => "applied",
            RequestState::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FindReplaceEngine {
    planner: ReplacementPlanner,
    mutator: ResourceMutator,
}

impl FindReplaceEngine {
    pub fn new(encoding: TextEncoding, zero_match: ZeroMatchPolicy) -> Self {
        Self {
            planner: ReplacementPlanner::new(encoding, zero_match),
            mutator: ResourceMutator::new(),
        }
    }

    pub fn from_config(config: &BytepatchConfig) -> Self {
        Self::new(config.encoding.scheme, config.policy.zero_match)
    }

    pub fn planner(&self) -> &ReplacementPlanner {
        &self.planner
    }

    /// Plans `request` against `resource` without applying it.
    ///
    /// A plan denied by the length policy is returned rather than treated as an error.
    pub fn dry_run(
        &self,
        resource: &dyn Resource,
        request: &FindReplaceRequest,
    ) -> Result<ReplacementPlan, FindReplaceError> {
        let plan = self.planner.evaluate(
            resource.data(),
            &request.find_text,
            &request.replace_text,
            request.null_terminate,
            request.allow_overflow,
        )?;
        Ok(plan)
    }

    /// Runs `request` against `resource` and commits the result.
    ///
    /// Either every occurrence is replaced and committed, or the resource keeps its
    /// previous contents. Observers are notified once, after a successful commit.
    pub fn execute(
        &self,
        resource: &mut dyn Resource,
        request: &FindReplaceRequest,
        observers: &mut [&mut dyn ChangeObserver],
    ) -> Result<FindReplaceOutcome, FindReplaceError> {
        let span = info_span!("find_replace", resource = resource.id());
        let _guard = span.enter();

        let mut state = RequestState::Received;
        debug!(
            %state,
            find_len = request.find_text.len(),
            replace_len = request.replace_text.len(),
            null_terminate = request.null_terminate,
            allow_overflow = request.allow_overflow
        );

        let plan = match self.planner.plan(
            resource.data(),
            &request.find_text,
            &request.replace_text,
            request.null_terminate,
            request.allow_overflow,
        ) {
            Ok(plan) => plan,
            Err(err) => {
                state = RequestState::Denied;
                warn!(%state, error = %err, "Request rejected");
                return Err(err.into());
            }
        };
        state = RequestState::Planned;
        debug!(%state, occurrences = plan.occurrences().len());

        let old_len = resource.data().len();
        if plan.is_noop() {
            state = RequestState::Completed;
            info!(%state, "No occurrences found; resource left unchanged");
            return Ok(FindReplaceOutcome {
                resource_id: resource.id().to_string(),
                occurrences: 0,
                changed: false,
                old_len,
                new_len: old_len,
            });
        }

        let output = self.mutator.apply(resource.data(), &plan)?;
        let event = change_event(resource.id(), &plan, &output);

        resource.commit(output).map_err(|err| {
            warn!(error = %err, "Commit failed; original contents kept");
            MutationError::from(err)
        })?;
        state = RequestState::Applied;
        info!(
            %state,
            occurrences = event.occurrences,
            old_len = event.old_len,
            new_len = event.new_len,
            "Replaced occurrences"
        );

        notify(observers, &event);

        state = RequestState::Completed;
        debug!(%state);
        Ok(FindReplaceOutcome {
            resource_id: event.resource_id,
            occurrences: event.occurrences,
            changed: true,
            old_len: event.old_len,
            new_len: event.new_len,
        })
    }
}

fn change_event(
    resource_id: &str,
    plan: &ReplacementPlan,
    output: &ResourceBuffer,
) -> ResourceChanged {
    ResourceChanged {
        resource_id: resource_id.to_string(),
        occurrences: plan.occurrences().len(),
        old_len: plan.source_len(),
        new_len: output.len(),
        old_md5: hex_digest(&plan.source_digest()),
        new_md5: hex_digest(&output.digest()),
    }
}

fn notify(observers: &mut [&mut dyn ChangeObserver], event: &ResourceChanged) {
    for obs in observers.iter_mut() {
        if let Err(e) = obs.on_resource_changed(event) {
            warn!(observer = obs.name(), error = %e, "Observer failed to handle change");
        }
    }
}
