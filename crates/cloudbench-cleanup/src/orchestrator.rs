//! Cleanup pipeline: list, filter, delete with bounded concurrency, confirm.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cloudbench_core::metrics::{
    CLEANUP_DELETE_ATTEMPTS, CLEANUP_DURATION, CLEANUP_LIST_FAILURES, CLEANUP_RESOURCES,
};
use cloudbench_core::{AtomicActions, CredentialSet, ResourceId};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{self, sleep, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::is_not_found;
use crate::error::{CleanupError, CleanupResult};
use crate::manager::ResourceManager;
use crate::policy::DeletionPolicy;
use crate::registry::{RegisteredResource, ResourceRegistry, ResourceSelector};
use crate::report::{CleanupFailure, CleanupReport, FailureReason, ListFailure, TaskOutcome};
use crate::scope::Scope;
use crate::spec::ResourceSpec;

/// Result of one delete-and-confirm task.
#[derive(Debug)]
struct TaskReport {
    attempts: u32,
    polls: u32,
    result: Result<(), FailureReason>,
}

/// What the orchestrator remembers about a task while it runs, so a
/// panicked worker can still be reported.
struct TaskMeta {
    resource_id: ResourceId,
    resource_name: Option<String>,
    scope: String,
}

/// Deletes benchmark resources registered in a [`ResourceRegistry`].
pub struct CleanupOrchestrator {
    registry: Arc<ResourceRegistry>,
    policy: Arc<DeletionPolicy>,
}

impl CleanupOrchestrator {
    #[must_use]
    pub fn new(registry: Arc<ResourceRegistry>, policy: DeletionPolicy) -> Self {
        Self {
            registry,
            policy: Arc::new(policy),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn policy(&self) -> &DeletionPolicy {
        &self.policy
    }

    /// Cleans up every resource type matching `selectors` (all registered
    /// types when empty) in ascending `order`.
    ///
    /// `admin_required` keeps only types whose `admin_required` flag equals
    /// it; `None` keeps everything.
    ///
    /// Partial failures never fail the call; they are returned in the report.
    ///
    /// # Errors
    ///
    /// Fails before any remote call on misuse: an unknown selector, an empty
    /// credential set, or an admin-only/admin-required type selected without
    /// an admin credential.
    pub async fn cleanup(
        &self,
        credentials: &CredentialSet,
        selectors: &[ResourceSelector],
        admin_required: Option<bool>,
    ) -> CleanupResult<CleanupReport> {
        let resources = self.plan(credentials, selectors, admin_required)?;
        let run_id = Uuid::new_v4();

        async move {
            info!(resource_types = resources.len(), "Starting cleanup");

            let actions = AtomicActions::new();
            let mut report = CleanupReport::default();

            for entry in &resources {
                let span = info_span!("cleanup_resource", resource = %entry.spec);
                let _timer = actions.start(format!("cleanup.{}", entry.spec.key()));
                let started = Instant::now();

                self.cleanup_resource(entry, credentials, &mut report)
                    .instrument(span)
                    .await;

                CLEANUP_DURATION
                    .with_label_values(&[&entry.spec.service, &entry.spec.resource_type])
                    .observe(started.elapsed().as_secs_f64());
            }

            report.actions = actions.snapshot();

            info!(
                deleted = report.deleted,
                failed = report.failed.len(),
                list_failures = report.list_failures.len(),
                skipped = report.skipped,
                "Cleanup finished"
            );

            Ok(report)
        }
        .instrument(info_span!("cleanup", run_id = %run_id))
        .await
    }

    /// Resolves and checks the resource types of a run.
    fn plan(
        &self,
        credentials: &CredentialSet,
        selectors: &[ResourceSelector],
        admin_required: Option<bool>,
    ) -> CleanupResult<Vec<RegisteredResource>> {
        let mut resources = self.registry.resources_for(selectors)?;

        if let Some(admin_required) = admin_required {
            resources.retain(|entry| entry.spec.admin_required == admin_required);
        }

        if credentials.is_empty() {
            return Err(CleanupError::NoCredentials);
        }

        if credentials.admin().is_none() {
            if let Some(entry) = resources
                .iter()
                .find(|entry| entry.spec.admin_required || entry.spec.perform_for_admin_only)
            {
                return Err(CleanupError::MissingAdminCredential {
                    resource: entry.spec.key(),
                });
            }
        }

        Ok(resources)
    }

    /// Scopes a resource type is listed in.
    ///
    /// Admin-only types, and every type when there are no users, use the
    /// admin scope. Otherwise each user is a scope, collapsed to the first
    /// user per tenant for tenant resources and for admin-required types,
    /// whose listings are narrowed to the tenant.
    fn scopes_for(spec: &ResourceSpec, credentials: &CredentialSet) -> Vec<Scope> {
        let admin = credentials.admin().cloned();

        if spec.perform_for_admin_only || credentials.users().is_empty() {
            return admin.map(Scope::admin).into_iter().collect();
        }

        let per_tenant = spec.tenant_resource || spec.admin_required;
        let mut tenants = HashSet::new();
        credentials
            .users()
            .iter()
            .enumerate()
            .filter(|(_, user)| !per_tenant || tenants.insert(user.credential().tenant()))
            .map(|(index, user)| Scope::user(index, Arc::clone(user), admin.clone()))
            .collect()
    }

    async fn cleanup_resource(
        &self,
        entry: &RegisteredResource,
        credentials: &CredentialSet,
        report: &mut CleanupReport,
    ) {
        let spec = &entry.spec;

        // List phase
        let mut listed: Vec<Box<dyn ResourceManager>> = Vec::new();
        let mut seen = HashSet::new();
        for scope in Self::scopes_for(spec, credentials) {
            match entry.plugin.list(spec, &scope).await {
                Ok(managers) => {
                    debug!(scope = %scope, count = managers.len(), "Listed resources");
                    // One task per resource, even when scopes overlap.
                    for manager in managers {
                        if seen.insert((manager.tenant(), manager.identity())) {
                            listed.push(manager);
                        }
                    }
                }
                Err(error) => {
                    warn!(scope = %scope, error = %error, "Listing failed");
                    CLEANUP_LIST_FAILURES
                        .with_label_values(&[&spec.service, &spec.resource_type])
                        .inc();
                    report.list_failures.push(ListFailure {
                        spec: Arc::clone(spec),
                        scope: scope.label(),
                        error,
                    });
                }
            }
        }

        // Filter phase
        let total = listed.len();
        let targets: Vec<Box<dyn ResourceManager>> = listed
            .into_iter()
            .filter(|manager| manager.is_deletion_target(&self.policy))
            .collect();
        let skipped = total - targets.len();
        if skipped > 0 {
            report.skipped += skipped;
            CLEANUP_RESOURCES
                .with_label_values(&[&spec.service, &spec.resource_type, "skipped"])
                .inc_by(skipped as u64);
        }

        if targets.is_empty() {
            debug!(skipped, "Nothing to delete");
            return;
        }

        info!(targets = targets.len(), skipped, "Deleting resources");
        self.delete_all(spec, targets, report).await;
    }

    /// Delete phase: runs every task on a pool of `spec.concurrency` workers
    /// and folds the results into `report` in listing order.
    async fn delete_all(
        &self,
        spec: &Arc<ResourceSpec>,
        targets: Vec<Box<dyn ResourceManager>>,
        report: &mut CleanupReport,
    ) {
        let workers = spec.concurrency.min(targets.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut join_set = JoinSet::new();
        let mut meta = Vec::with_capacity(targets.len());

        for (index, manager) in targets.into_iter().enumerate() {
            meta.push(TaskMeta {
                resource_id: manager.identity(),
                resource_name: manager.display_name(),
                scope: manager.scope().label(),
            });

            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // The semaphore is never closed; the permit is held until the
                // task finishes.
                let _permit = semaphore.acquire().await;
                (index, run_task(manager.as_ref()).await)
            });
        }

        let mut results: Vec<Option<TaskReport>> = meta.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, task)) => results[index] = Some(task),
                Err(join_error) => error!(error = %join_error, "Cleanup worker failed"),
            }
        }

        for (meta, task) in meta.into_iter().zip(results) {
            let result = match task {
                Some(task) => {
                    report.delete_attempts += task.attempts as usize;
                    report.status_polls += task.polls as usize;
                    task.result
                }
                None => Err(FailureReason::WorkerPanicked),
            };

            let outcome = match result {
                Ok(()) => {
                    report.deleted += 1;
                    TaskOutcome::Deleted
                }
                Err(reason) => {
                    let outcome = reason.outcome();
                    report.failed.push(CleanupFailure {
                        resource_id: meta.resource_id,
                        resource_name: meta.resource_name,
                        spec: Arc::clone(spec),
                        scope: meta.scope,
                        reason,
                    });
                    outcome
                }
            };

            CLEANUP_RESOURCES
                .with_label_values(&[&spec.service, &spec.resource_type, outcome.as_str()])
                .inc();
        }
    }
}

/// Deletes one resource, retrying up to `max_attempts`, then polls until
/// the deletion is confirmed or `timeout` elapses.
async fn run_task(manager: &dyn ResourceManager) -> TaskReport {
    let spec = manager.spec();
    let resource_id = manager.identity();
    let mut attempts = 0;

    loop {
        attempts += 1;
        CLEANUP_DELETE_ATTEMPTS
            .with_label_values(&[&spec.service, &spec.resource_type])
            .inc();

        match manager.delete().await {
            Ok(()) => break,
            Err(error) if is_not_found(&error) => {
                debug!(resource_id = %resource_id, "Resource already gone");
                return TaskReport {
                    attempts,
                    polls: 0,
                    result: Ok(()),
                };
            }
            Err(error) if attempts >= spec.max_attempts => {
                warn!(
                    resource_id = %resource_id,
                    attempts,
                    error = %error,
                    "Giving up on resource"
                );
                return TaskReport {
                    attempts,
                    polls: 0,
                    result: Err(FailureReason::DeleteFailed { attempts, error }),
                };
            }
            Err(error) => {
                debug!(
                    resource_id = %resource_id,
                    attempt = attempts,
                    max_attempts = spec.max_attempts,
                    error = %error,
                    "Delete failed, retrying"
                );
                sleep(spec.interval).await;
            }
        }
    }

    let (polls, confirmed) = wait_for_deletion(manager, spec.timeout, spec.interval).await;
    if !confirmed {
        warn!(resource_id = %resource_id, timeout = ?spec.timeout, "Deletion not confirmed");
    }

    TaskReport {
        attempts,
        polls,
        result: if confirmed {
            Ok(())
        } else {
            Err(FailureReason::Timeout {
                waited: spec.timeout,
            })
        },
    }
}

/// Polls `is_deleted` every `interval` until it holds or `timeout` elapses.
/// A status call still in flight at the deadline is abandoned.
/// Returns the number of polls and whether deletion was confirmed.
async fn wait_for_deletion(
    manager: &dyn ResourceManager,
    timeout: Duration,
    interval: Duration,
) -> (u32, bool) {
    let started = Instant::now();
    let mut polls = 0;

    let polling = async {
        while started.elapsed() < timeout {
            polls += 1;
            if manager.is_deleted().await {
                return true;
            }
            sleep(interval).await;
        }
        false
    };
    let confirmed = time::timeout(timeout, polling).await.unwrap_or(false);

    (polls, confirmed)
}
