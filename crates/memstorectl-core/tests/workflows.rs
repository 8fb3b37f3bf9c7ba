//! Workflow tests against an in-memory ClusterApi

use std::collections::VecDeque;
use std::future::pending;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use memstorectl_core::cluster::{
    ClusterCreateInput, ClusterCreateRequest, ClusterOutcome, ClusterStatus, EndpointInput,
    IpamConfig, WaitOptions, WaitRequest, create_cluster_and_wait, delete_cluster_and_wait,
    wait_for_cluster,
};
use memstorectl_core::{ApiError, Cluster, ClusterApi, CoreError, Result};

const ZONE: &str = "fr-par-1";
const ID: &str = "11111111-1111-1111-1111-111111111111";

#[derive(Clone, Copy)]
enum Reply {
    Status(&'static str),
    NotFound,
}

/// Replays scripted `get_cluster` replies, repeating the last one
struct FakeApi {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Reply>,
    get_calls: AtomicUsize,
    created: Mutex<Vec<ClusterCreateRequest>>,
    deleted: Mutex<Vec<(String, String)>>,
}

impl FakeApi {
    fn new(replies: Vec<Reply>) -> Self {
        let last = *replies.last().expect("at least one reply");
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(last),
            get_calls: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

fn cluster(status: &str) -> Cluster {
    Cluster {
        id: ID.to_string(),
        name: "cache".to_string(),
        zone: ZONE.to_string(),
        status: ClusterStatus::from(status.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl ClusterApi for FakeApi {
    async fn create_cluster(&self, request: &ClusterCreateRequest) -> Result<Cluster> {
        self.created.lock().unwrap().push(request.clone());
        Ok(cluster("provisioning"))
    }

    async fn get_cluster(&self, zone: &str, cluster_id: &str) -> Result<Cluster> {
        assert_eq!(zone, ZONE);
        assert_eq!(cluster_id, ID);
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(*self.last.lock().unwrap());
        match reply {
            Reply::Status(status) => Ok(cluster(status)),
            Reply::NotFound => Err(ApiError::NotFound {
                message: "cluster not found".to_string(),
            }
            .into()),
        }
    }

    async fn list_clusters(&self, _zone: &str) -> Result<Vec<Cluster>> {
        Ok(vec![])
    }

    async fn delete_cluster(&self, zone: &str, cluster_id: &str) -> Result<Cluster> {
        self.deleted
            .lock()
            .unwrap()
            .push((zone.to_string(), cluster_id.to_string()));
        Ok(cluster("deleting"))
    }
}

fn create_input() -> ClusterCreateInput {
    ClusterCreateInput::new(ZONE, "cache", "RED1-MICRO", "7.0.5")
        .with_credentials("admin", "P4ssw0rd!")
        .with_endpoint(
            EndpointInput::private_network("pn-1")
                .with_service_ip("10.0.0.5/24")
                .with_ipam(true),
        )
}

#[tokio::test(start_paused = true)]
async fn create_without_wait_returns_submitted() {
    let api = FakeApi::new(vec![Reply::Status("ready")]);

    let outcome = create_cluster_and_wait(
        &api,
        &create_input(),
        &WaitOptions::default(),
        pending(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ClusterOutcome::Submitted(cluster("provisioning")));
    assert_eq!(api.gets(), 0);

    let created = api.created.lock().unwrap();
    let pn = created[0].endpoints[0].private_network.as_ref().unwrap();
    assert_eq!(pn.ipam_config, Some(IpamConfig {}));
    assert_eq!(pn.service_ips, vec!["10.0.0.5/24".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn create_with_wait_polls_until_ready() {
    let api = FakeApi::new(vec![
        Reply::Status("provisioning"),
        Reply::Status("provisioning"),
        Reply::Status("ready"),
    ]);

    let outcome = create_cluster_and_wait(
        &api,
        &create_input(),
        &WaitOptions::waiting(),
        pending(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ClusterOutcome::Ready(cluster("ready")));
    assert_eq!(api.gets(), 3);
}

#[tokio::test(start_paused = true)]
async fn create_with_invalid_input_sends_nothing() {
    let api = FakeApi::new(vec![Reply::Status("ready")]);
    let input = create_input().with_endpoint(EndpointInput::private_network(""));

    let err = create_cluster_and_wait(&api, &input, &WaitOptions::waiting(), pending(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert!(api.created.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn create_with_bad_wait_timing_sends_nothing() {
    let api = FakeApi::new(vec![Reply::Status("ready")]);
    let options = WaitOptions {
        wait: true,
        timeout: Duration::from_secs(1),
        interval: Duration::from_secs(5),
    };

    let err = create_cluster_and_wait(&api, &create_input(), &options, pending(), None)
        .await
        .unwrap_err();

    assert!(err.is_bad_request());
    assert!(api.created.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn delete_with_wait_treats_not_found_as_success() {
    let api = FakeApi::new(vec![
        Reply::Status("deleting"),
        Reply::Status("deleting"),
        Reply::NotFound,
    ]);

    let outcome = delete_cluster_and_wait(&api, ZONE, ID, &WaitOptions::waiting(), pending(), None)
        .await
        .unwrap();

    match outcome {
        ClusterOutcome::Deleted { last_seen } => {
            assert_eq!(last_seen.unwrap().status, ClusterStatus::Deleting);
        }
        other => panic!("expected Deleted, got {other:?}"),
    }
    assert_eq!(api.gets(), 3);
    assert_eq!(
        *api.deleted.lock().unwrap(),
        vec![(ZONE.to_string(), ID.to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn delete_gone_on_first_fetch_keeps_delete_response() {
    let api = FakeApi::new(vec![Reply::NotFound]);
    let start = tokio::time::Instant::now();

    let outcome = delete_cluster_and_wait(&api, ZONE, ID, &WaitOptions::waiting(), pending(), None)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ClusterOutcome::Deleted {
            last_seen: Some(cluster("deleting"))
        }
    );
    assert_eq!(api.gets(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn delete_without_wait_does_not_poll() {
    let api = FakeApi::new(vec![Reply::NotFound]);

    let outcome = delete_cluster_and_wait(&api, ZONE, ID, &WaitOptions::default(), pending(), None)
        .await
        .unwrap();

    assert_eq!(outcome, ClusterOutcome::Submitted(cluster("deleting")));
    assert_eq!(api.gets(), 0);
}

#[tokio::test(start_paused = true)]
async fn standalone_wait_rejects_not_found() {
    let api = FakeApi::new(vec![Reply::Status("provisioning"), Reply::NotFound]);

    let err = wait_for_cluster(&api, &WaitRequest::new(ZONE, ID), pending(), None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(api.gets(), 2);
}

#[tokio::test(start_paused = true)]
async fn standalone_wait_times_out() {
    let api = FakeApi::new(vec![Reply::Status("provisioning")]);
    let request = WaitRequest::new(ZONE, ID)
        .with_timeout(Duration::from_secs(60))
        .with_retry_interval(Duration::from_secs(15));

    let err = wait_for_cluster(&api, &request, pending(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::WaitTimeout { .. }));
    assert_eq!(err.last_status(), Some("provisioning"));
    assert_eq!(api.gets(), 5);
}

#[tokio::test(start_paused = true)]
async fn standalone_wait_works_through_trait_object() {
    let api: Box<dyn ClusterApi> = Box::new(FakeApi::new(vec![
        Reply::Status("autohealing"),
        Reply::Status("locked"),
    ]));

    let cluster = wait_for_cluster(api.as_ref(), &WaitRequest::new(ZONE, ID), pending(), None)
        .await
        .unwrap();

    assert_eq!(cluster.status, ClusterStatus::Locked);
}
