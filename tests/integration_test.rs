use replset::{
    GroupScaler, InMemoryReplicatedStore, MemberId, MemberRole, MembershipListener,
    ReplicaSetConfig, ReplicaSetController, ReplicaSetMember, ReplicaSetOptions, ReplicaSetState, ResizeError,
    ScaleError,
};
use slog::Drain;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

#[tokio::test]
async fn bootstrap_join_failover_and_leave() -> Result<(), Box<dyn Error>> {
    let store = InMemoryReplicatedStore::new();
    let scaler = Arc::new(CountingScaler::new(3));
    let replica_set = create_replica_set("rs-integ", scaler.clone())?;

    let a = store.create_member("a", "10.0.0.1:27017");
    let b = store.create_member("b", "10.0.0.2:27017");
    let c = store.create_member("c", "10.0.0.3:27017");
    // c boots slowly. Its join has to wait without holding up anything else.
    c.set_available(false);

    replica_set.on_member_added(a.clone());
    replica_set.on_member_added(b.clone());
    replica_set.on_member_added(c.clone());

    wait_for(|| store.configuration().len() == 2, Duration::from_secs(5)).await;
    assert_eq!(store.set_name(), Some("rs-integ".to_string()));
    assert_eq!(store.primary_key(), Some("a".to_string()));
    assert_eq!(replica_set.status().state, ReplicaSetState::Stable);
    assert!(replica_set.status().service_up);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(store.configuration().len(), 2);

    c.set_available(true);
    wait_for(|| store.configuration().len() == 3, Duration::from_secs(5)).await;
    assert_eq!(
        store.configuration(),
        vec![
            (MemberId::new(0), "a".to_string()),
            (MemberId::new(1), "b".to_string()),
            (MemberId::new(2), "c".to_string()),
        ]
    );
    assert_eq!(keys(replica_set.secondaries()), vec!["b", "c"]);
    assert_eq!(
        replica_set.endpoints(),
        vec!["10.0.0.1:27017", "10.0.0.2:27017", "10.0.0.3:27017"]
    );
    assert_eq!(replica_set.primary_endpoint(), Some("10.0.0.1:27017".to_string()));

    // a crashes and the set elects b.
    a.set_available(false);
    store.elect("b")?;
    replica_set.on_primary_signal(b.as_ref(), true);
    replica_set.on_member_removed(a.as_ref());

    wait_for(|| store.configuration().len() == 2, Duration::from_secs(5)).await;
    assert_eq!(replica_set.primary().map(|p| p.key().to_string()), Some("b".to_string()));
    assert_eq!(b.role(), MemberRole::Primary);
    assert_eq!(replica_set.primary_endpoint(), Some("10.0.0.2:27017".to_string()));

    // Scale-down must never pick the primary.
    let candidate = replica_set.removal_candidate().expect("Expected a removal candidate");
    assert_eq!(candidate.key(), "c");

    replica_set.shutdown().await;
    assert_eq!(replica_set.status().state, ReplicaSetState::Stopped);

    Ok(())
}

#[tokio::test]
async fn resize_keeps_an_odd_number_of_voters() -> Result<(), Box<dyn Error>> {
    let scaler = Arc::new(CountingScaler::new(3));
    let replica_set = create_replica_set("rs-resize", scaler.clone())?;

    let rejected = replica_set.resize(4).await;
    assert!(matches!(
        rejected,
        Err(ResizeError::EvenMemberCount {
            desired: 4,
            current_size: 3
        })
    ));
    assert!(matches!(replica_set.resize(9).await, Err(ResizeError::AboveMaximum { .. })));
    assert_eq!(scaler.calls(), 0);

    assert_eq!(replica_set.resize(5).await?, 5);
    assert_eq!(scaler.current_size(), 5);
    assert_eq!(scaler.calls(), 1);

    replica_set.shutdown().await;

    Ok(())
}

#[tokio::test]
async fn status_stream_reports_lifecycle() -> Result<(), Box<dyn Error>> {
    let store = InMemoryReplicatedStore::new();
    let replica_set = create_replica_set("rs-status", Arc::new(CountingScaler::new(1)))?;
    let mut status_listener = replica_set.status_listener();
    assert_eq!(status_listener.current().state, ReplicaSetState::Empty);

    replica_set.on_member_added(store.create_member("a", "10.0.0.1:27017"));
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let status = tokio::time::timeout_at(deadline, status_listener.next())
            .await
            .expect("Timeout waiting for bootstrap")
            .expect("Expected status stream to be alive");
        if status.state == ReplicaSetState::Stable {
            assert!(status.service_up);
            break;
        }
    }

    replica_set.shutdown().await;
    let status = status_listener.current();
    assert_eq!(status.state, ReplicaSetState::Stopped);
    assert!(!status.service_up);

    Ok(())
}

fn create_replica_set(name: &str, scaler: Arc<dyn GroupScaler>) -> Result<ReplicaSetController, Box<dyn Error>> {
    let replica_set = replset::try_create_replica_set(ReplicaSetConfig {
        name: name.to_string(),
        info_logger: create_root_logger_for_stdout(name.to_string()),
        scaler,
        options: ReplicaSetOptions {
            retry_delay: Some(Duration::from_millis(20)),
            ..ReplicaSetOptions::default()
        },
    })?;

    Ok(replica_set)
}

fn keys(members: Vec<replset::Member>) -> Vec<String> {
    members.iter().map(|member| member.key().to_string()).collect()
}

async fn wait_for<F: Fn() -> bool>(condition: F, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        if Instant::now() >= deadline {
            panic!("Timeout waiting for condition");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn create_root_logger_for_stdout(replica_set: String) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Test" => replica_set))
}

async fn sleep(duration: Duration) {
    println!("Sleep {}ms", duration.as_millis());
    tokio::time::sleep(duration).await;
    println!("Awake!");
}

struct CountingScaler {
    size: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingScaler {
    fn new(size: usize) -> Self {
        CountingScaler {
            size: AtomicUsize::new(size),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GroupScaler for CountingScaler {
    fn current_size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    async fn resize(&self, desired: usize) -> Result<usize, ScaleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.size.store(desired, Ordering::SeqCst);

        Ok(desired)
    }
}
