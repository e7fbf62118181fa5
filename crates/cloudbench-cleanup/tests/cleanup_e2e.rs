//! E2E tests: cleanup pipeline against the mock cloud
//!
//! Covers:
//! 1. Retry then confirmation polling
//! 2. Exhausted attempts isolated from siblings
//! 3. Confirmation timeout
//! 4. Tenant de-duplication
//! 5. Strict ordering between resource types
//! 6. Listing failure isolation
//! 7. Admin scoping and one delete per resource
//! 8. Built-in resource types and the deletion policy

use std::sync::Arc;
use std::time::Duration;

use cloudbench_cleanup::resources::default_registry;
use cloudbench_cleanup::{
    CleanupError, CleanupOrchestrator, DeletionPolicy, FailureReason, ResourceRegistry,
    ResourceSelector, ResourceSpec, TaskOutcome,
};
use cloudbench_core::mock::{MockCloud, MockFailure, MockStatus};
use cloudbench_core::{
    Clients, CloudError, Credential, CredentialSet, Permission, RawResource, ResourceDefaults,
    TenantId,
};

const AUTH_URL: &str = "http://keystone:5000/v3";

fn user(cloud: &Arc<MockCloud>, name: &str, tenant: &str) -> Clients {
    Clients::new(
        Credential::new(AUTH_URL, name, "pw").with_tenant_id(tenant),
        cloud.clone(),
    )
}

fn admin(cloud: &Arc<MockCloud>) -> Clients {
    Clients::new(
        Credential::new(AUTH_URL, "admin", "pw")
            .with_tenant_id("admin")
            .with_permission(Permission::Admin),
        cloud.clone(),
    )
}

fn single_user(cloud: &Arc<MockCloud>) -> CredentialSet {
    CredentialSet::new(None, vec![user(cloud, "u1", "t1")]).unwrap()
}

fn orchestrator(specs: Vec<ResourceSpec>) -> CleanupOrchestrator {
    let mut registry = ResourceRegistry::new();
    for spec in specs {
        registry.register_generic(spec);
    }
    CleanupOrchestrator::new(Arc::new(registry), DeletionPolicy::default())
}

fn selectors(raw: &[&str]) -> Vec<ResourceSelector> {
    raw.iter().map(|s| s.parse().unwrap()).collect()
}

fn named(id: &str) -> RawResource {
    RawResource::new(id).with_name(format!("cloudbench-{}", id))
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_confirm() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("nova", "servers", named("s1").with_status("ACTIVE"));
    cloud.fail_deletes(
        "s1",
        vec![
            MockFailure::Transient("503 Service Unavailable"),
            MockFailure::Http(409),
        ],
    );
    cloud.keep_after_delete("s1");
    cloud.script_statuses(
        "s1",
        vec![
            MockStatus::Present(RawResource::new("s1").with_status("ACTIVE")),
            MockStatus::Gone,
            MockStatus::Gone,
        ],
    );

    let orchestrator = orchestrator(vec![ResourceSpec::builder("nova", "servers")
        .order(1)
        .max_attempts(3)
        .timeout(Duration::from_secs(5))
        .interval(Duration::from_secs(1))
        .build()
        .unwrap()]);

    let report = orchestrator
        .cleanup(&single_user(&cloud), &[], None)
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert!(report.failed.is_empty());
    assert_eq!(report.delete_attempts, 3);
    assert_eq!(cloud.delete_calls("s1"), 3);
    // Polling stops at the first confirmation, so the scripted third
    // status is never fetched.
    assert_eq!(report.status_polls, 2);
    assert_eq!(cloud.get_calls("s1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_attempts_do_not_block_siblings() {
    let cloud = Arc::new(MockCloud::new());
    for id in ["v1", "v2", "v3"] {
        cloud.add_resource("cinder", "volumes", named(id));
    }
    cloud.fail_deletes(
        "v2",
        vec![
            MockFailure::Http(500),
            MockFailure::Http(500),
            MockFailure::Api("VolumeIsBusy"),
        ],
    );

    let orchestrator = orchestrator(vec![ResourceSpec::builder("cinder", "volumes")
        .max_attempts(3)
        .build()
        .unwrap()]);

    let report = orchestrator
        .cleanup(&single_user(&cloud), &[], None)
        .await
        .unwrap();

    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(cloud.delete_calls("v2"), 3);

    let failure = &report.failed[0];
    assert_eq!(failure.resource_id.as_str(), "v2");
    assert_eq!(failure.resource_name.as_deref(), Some("cloudbench-v2"));
    assert_eq!(failure.outcome(), TaskOutcome::FailedDelete);
    assert_eq!(
        failure.reason,
        FailureReason::DeleteFailed {
            attempts: 3,
            error: CloudError::api("VolumeIsBusy", "mock failure"),
        }
    );

    assert!(!cloud.contains("cinder", "volumes", "v1"));
    assert!(cloud.contains("cinder", "volumes", "v2"));
    assert!(!cloud.contains("cinder", "volumes", "v3"));
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_deletion_times_out() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("glance", "images", named("stuck").with_status("active"));
    cloud.add_resource("glance", "images", named("ok"));
    cloud.keep_after_delete("stuck");

    let orchestrator = orchestrator(vec![ResourceSpec::builder("glance", "images")
        .timeout(Duration::from_secs(5))
        .interval(Duration::from_secs(1))
        .build()
        .unwrap()]);

    let started = tokio::time::Instant::now();
    let report = orchestrator
        .cleanup(&single_user(&cloud), &[], None)
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].resource_id.as_str(), "stuck");
    assert_eq!(
        report.failed[0].reason,
        FailureReason::Timeout {
            waited: Duration::from_secs(5)
        }
    );
    assert_eq!(report.failures_with(TaskOutcome::FailedTimeout).count(), 1);
    assert_eq!(cloud.get_calls("stuck"), 5);
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_slow_status_check_is_bounded_by_timeout() {
    let cloud = Arc::new(MockCloud::new().with_latency(Duration::from_secs(60)));
    cloud.add_resource("glance", "images", named("i1"));

    let orchestrator = orchestrator(vec![ResourceSpec::builder("glance", "images")
        .timeout(Duration::from_secs(5))
        .interval(Duration::from_secs(1))
        .build()
        .unwrap()]);

    let started = tokio::time::Instant::now();
    let report = orchestrator
        .cleanup(&single_user(&cloud), &[], None)
        .await
        .unwrap();

    // 60s to list, 60s to delete, then 5s of confirmation.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(125), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(130), "{:?}", elapsed);
    assert_eq!(report.status_polls, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        report.failed[0].reason,
        FailureReason::Timeout {
            waited: Duration::from_secs(5)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_tenant_resource_deleted_once_per_tenant() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("neutron", "pools", named("p1").with_tenant("t1"));
    cloud.add_resource("neutron", "pools", named("p2").with_tenant("t2"));

    let credentials = CredentialSet::new(
        None,
        vec![
            user(&cloud, "u1", "t1"),
            user(&cloud, "u2", "t1"),
            user(&cloud, "u3", "t2"),
        ],
    )
    .unwrap();
    let registry = default_registry(&ResourceDefaults::default()).unwrap();
    let orchestrator = CleanupOrchestrator::new(Arc::new(registry), DeletionPolicy::default());

    let report = orchestrator
        .cleanup(&credentials, &selectors(&["neutron.pools"]), None)
        .await
        .unwrap();

    assert_eq!(report.deleted, 2);
    assert_eq!(cloud.delete_calls("p1"), 1);
    assert_eq!(cloud.delete_calls("p2"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resource_types_run_in_order() {
    let cloud = Arc::new(MockCloud::new().with_latency(Duration::from_millis(50)));
    for id in ["s1", "s2", "s3"] {
        cloud.add_resource("nova", "servers", named(id));
    }
    for id in ["n1", "n2"] {
        cloud.add_resource("neutron", "networks", named(id));
    }

    // Registered dependency-last, so only `order` can put servers first.
    let orchestrator = orchestrator(vec![
        ResourceSpec::builder("neutron", "networks")
            .order(10)
            .build()
            .unwrap(),
        ResourceSpec::builder("nova", "servers")
            .order(0)
            .build()
            .unwrap(),
    ]);

    let report = orchestrator
        .cleanup(&single_user(&cloud), &[], None)
        .await
        .unwrap();
    assert_eq!(report.deleted, 5);

    let history = cloud.call_history();
    let last_nova = history.iter().rposition(|c| c.service == "nova").unwrap();
    let first_neutron = history.iter().position(|c| c.service == "neutron").unwrap();
    assert!(
        last_nova < first_neutron,
        "neutron was touched before nova finished"
    );

    let actions: Vec<_> = report.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(actions, vec!["cleanup.nova.servers", "cleanup.neutron.networks"]);
}

#[tokio::test(start_paused = true)]
async fn test_listing_failure_is_isolated() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("nova", "servers", named("s1").with_tenant("t1"));
    cloud.add_resource("nova", "servers", named("s2").with_tenant("t2"));
    cloud.add_resource("glance", "images", named("i1").with_tenant("t1"));
    cloud.fail_lists("nova", "servers", vec![MockFailure::Transient("503")]);

    let credentials = CredentialSet::new(
        None,
        vec![user(&cloud, "u1", "t1"), user(&cloud, "u2", "t2")],
    )
    .unwrap();
    let orchestrator = orchestrator(vec![
        ResourceSpec::builder("nova", "servers").order(1).build().unwrap(),
        ResourceSpec::builder("glance", "images").order(2).build().unwrap(),
    ]);

    let report = orchestrator.cleanup(&credentials, &[], None).await.unwrap();

    assert_eq!(report.list_failures.len(), 1);
    let failure = &report.list_failures[0];
    assert_eq!(failure.spec.key(), "nova.servers");
    assert_eq!(failure.scope, "user[0]");
    assert!(matches!(
        failure.error,
        CleanupError::Cloud(CloudError::Unavailable(_))
    ));

    // The second user's servers and the next type still went.
    assert_eq!(report.deleted, 2);
    assert!(cloud.contains("nova", "servers", "s1"));
    assert!(!cloud.contains("nova", "servers", "s2"));
    assert!(!cloud.contains("glance", "images", "i1"));
    assert!(!report.is_clean());
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_service_is_a_listing_failure() {
    let cloud = Arc::new(MockCloud::new());
    cloud.disable_service("designate");
    cloud.add_resource("nova", "servers", named("s1"));

    let orchestrator = orchestrator(vec![
        ResourceSpec::builder("designate", "domains").order(1).build().unwrap(),
        ResourceSpec::builder("nova", "servers").order(2).build().unwrap(),
    ]);

    let report = orchestrator
        .cleanup(&single_user(&cloud), &[], None)
        .await
        .unwrap();

    assert_eq!(report.list_failures.len(), 1);
    assert!(matches!(report.list_failures[0].error, CleanupError::Core(_)));
    assert_eq!(report.deleted, 1);
}

#[tokio::test]
async fn test_unknown_selector_is_misuse() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("nova", "servers", named("s1"));
    let orchestrator = orchestrator(vec![ResourceSpec::builder("nova", "servers")
        .build()
        .unwrap()]);

    let err = orchestrator
        .cleanup(&single_user(&cloud), &selectors(&["nova", "zaqar"]), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CleanupError::UnknownSelector(ref s) if s == "zaqar"));
    assert!(err.is_misuse());
    assert!(cloud.call_history().is_empty());
    assert!(cloud.contains("nova", "servers", "s1"));
}

#[tokio::test(start_paused = true)]
async fn test_admin_required_lists_per_user_tenant() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("neutron", "networks", named("n1").with_tenant("t1"));
    cloud.add_resource("neutron", "networks", named("n2").with_tenant("t2"));
    cloud.add_resource("neutron", "networks", named("shared").with_tenant("other"));

    let credentials = CredentialSet::new(
        Some(admin(&cloud)),
        vec![user(&cloud, "u1", "t1"), user(&cloud, "u2", "t2")],
    )
    .unwrap();
    let orchestrator = orchestrator(vec![ResourceSpec::builder("neutron", "networks")
        .admin_required(true)
        .build()
        .unwrap()]);

    let report = orchestrator.cleanup(&credentials, &[], None).await.unwrap();

    assert_eq!(report.deleted, 2);
    assert_eq!(cloud.delete_calls("n1"), 1);
    assert_eq!(cloud.delete_calls("n2"), 1);
    assert!(cloud.contains("neutron", "networks", "shared"));
    // Every call went through the admin credential.
    assert!(cloud
        .call_history()
        .iter()
        .all(|c| c.tenant == Some(TenantId::new("admin"))));
}

#[tokio::test(start_paused = true)]
async fn test_admin_required_deleted_once_for_shared_tenant() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("neutron", "networks", named("n1").with_tenant("t1"));

    let credentials = CredentialSet::new(
        Some(admin(&cloud)),
        vec![user(&cloud, "u1", "t1"), user(&cloud, "u2", "t1")],
    )
    .unwrap();
    let orchestrator = orchestrator(vec![ResourceSpec::builder("neutron", "networks")
        .admin_required(true)
        .build()
        .unwrap()]);

    let report = orchestrator.cleanup(&credentials, &[], None).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert!(report.is_clean());
    assert_eq!(cloud.delete_calls("n1"), 1);
    assert_eq!(cloud.list_calls("neutron", "networks"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_user_scopes_sharing_a_tenant_delete_once() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("cinder", "volumes", named("v1").with_tenant("t1"));

    let credentials = CredentialSet::new(
        None,
        vec![user(&cloud, "u1", "t1"), user(&cloud, "u2", "t1")],
    )
    .unwrap();
    let orchestrator = orchestrator(vec![ResourceSpec::builder("cinder", "volumes")
        .build()
        .unwrap()]);

    let report = orchestrator.cleanup(&credentials, &[], None).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(cloud.delete_calls("v1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_admin_required_filter() {
    let cloud = Arc::new(MockCloud::new());
    cloud.add_resource("keystone", "users", named("kusr"));
    cloud.add_resource("nova", "servers", named("s1"));

    let credentials =
        CredentialSet::new(Some(admin(&cloud)), vec![user(&cloud, "u1", "t1")]).unwrap();
    let registry = default_registry(&ResourceDefaults::default()).unwrap();
    let orchestrator = CleanupOrchestrator::new(Arc::new(registry), DeletionPolicy::default());

    let report = orchestrator
        .cleanup(&credentials, &selectors(&["nova", "keystone"]), Some(true))
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert!(!cloud.contains("keystone", "users", "kusr"));
    assert!(cloud.contains("nova", "servers", "s1"));
    assert_eq!(report.actions.len(), 1);
    assert_eq!(report.actions[0].name, "cleanup.keystone.users");
}

#[tokio::test(start_paused = true)]
async fn test_builtin_types_and_policy() {
    let cloud = Arc::new(MockCloud::new());
    // Vetted service: only prefixed names go.
    cloud.add_resource("nova", "servers", named("s1"));
    cloud.add_resource("nova", "servers", RawResource::new("s2").with_name("prod-db"));
    // Object storage is not vetted: everything goes, objects first.
    cloud.add_resource("swift", "containers", RawResource::new("backups"));
    cloud.add_resource(
        "swift",
        "objects",
        RawResource::new("backups/db.tar")
            .with_name("db.tar")
            .with_attribute("container", "backups"),
    );
    // Stack confirmed through its own status field.
    cloud.add_resource(
        "heat",
        "stacks",
        named("st1").with_attribute("stack_status", "CREATE_COMPLETE"),
    );
    cloud.keep_after_delete("st1");
    cloud.script_statuses(
        "st1",
        vec![MockStatus::Present(
            RawResource::new("st1").with_attribute("stack_status", "DELETE_COMPLETE"),
        )],
    );

    let registry = default_registry(&ResourceDefaults::default()).unwrap();
    let orchestrator = CleanupOrchestrator::new(Arc::new(registry), DeletionPolicy::default());

    let report = orchestrator
        .cleanup(&single_user(&cloud), &selectors(&["heat", "nova", "swift"]), None)
        .await
        .unwrap();

    assert!(report.is_clean(), "{:?}", report.failed);
    assert_eq!(report.deleted, 4);
    assert_eq!(report.skipped, 1);
    assert!(cloud.contains("nova", "servers", "s2"));
    assert_eq!(cloud.resource_count("swift", "objects"), 0);
    assert_eq!(cloud.resource_count("swift", "containers"), 0);

    let history = cloud.call_history();
    let object_delete = history
        .iter()
        .position(|c| c.operation == "delete" && c.resource_type == "objects")
        .unwrap();
    let container_delete = history
        .iter()
        .position(|c| c.operation == "delete" && c.resource_type == "containers")
        .unwrap();
    assert!(object_delete < container_delete);
}
