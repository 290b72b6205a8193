use crate::api::{GroupScaler, ScaleError};
use crate::member::{MemberId, MemberRole, ReplicaSetMember, ReplicatedStoreClient, StoreError};
use slog::Drain;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

pub(crate) fn test_logger() -> slog::Logger {
    let decorator = slog_term::PlainSyncDecorator::new(slog_term::TestStdoutWriter);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    slog::Logger::root(drain, slog::o!())
}

/// Polls `condition` until it holds, panicking after a generous real-time deadline.
pub(crate) async fn eventually<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        if Instant::now() >= deadline {
            panic!("Condition not met before deadline");
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum StoreCall {
    Initialize { via: String, set_name: String, id: MemberId },
    Add { via: String, member: String, id: MemberId },
    Remove { via: String, member: String },
}

/// Records every reconfiguration call. Does not model the store's state; tests drive roles by
/// hand through `FakeMember`.
pub(crate) struct FakeStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_initialize: AtomicBool,
    failing_reconfigurations: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(FakeStore {
            calls: Mutex::new(vec![]),
            fail_initialize: AtomicBool::new(false),
            failing_reconfigurations: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn initialize_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Initialize { .. }))
            .count()
    }

    pub(crate) fn fail_initialize(&self) {
        self.fail_initialize.store(true, Ordering::SeqCst);
    }

    /// The next `n` add/remove calls fail with a timeout. Failed calls are still recorded.
    pub(crate) fn fail_next_reconfigurations(&self, n: usize) {
        self.failing_reconfigurations.store(n, Ordering::SeqCst);
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn reconfiguration_result(&self) -> Result<(), StoreError> {
        let failing = self
            .failing_reconfigurations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match failing {
            Ok(_) => Err(StoreError::Timeout),
            Err(_) => Ok(()),
        }
    }
}

struct FakeStoreClient {
    store: Arc<FakeStore>,
    via: String,
}

#[async_trait::async_trait]
impl ReplicatedStoreClient for FakeStoreClient {
    async fn initialize_set(&self, set_name: &str, self_id: MemberId) -> Result<(), StoreError> {
        self.store.record(StoreCall::Initialize {
            via: self.via.clone(),
            set_name: set_name.to_string(),
            id: self_id,
        });
        if self.store.fail_initialize.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionRefused(self.via.clone()));
        }
        Ok(())
    }

    async fn add_member(&self, member: &dyn ReplicaSetMember, new_id: MemberId) -> Result<(), StoreError> {
        self.store.record(StoreCall::Add {
            via: self.via.clone(),
            member: member.key().to_string(),
            id: new_id,
        });
        self.store.reconfiguration_result()
    }

    async fn remove_member(&self, member: &dyn ReplicaSetMember) -> Result<(), StoreError> {
        self.store.record(StoreCall::Remove {
            via: self.via.clone(),
            member: member.key().to_string(),
        });
        self.store.reconfiguration_result()
    }
}

pub(crate) struct FakeMember {
    key: String,
    available: AtomicBool,
    availability_checks: AtomicUsize,
    role: Mutex<MemberRole>,
    endpoint: Mutex<Option<String>>,
    reported_primary_endpoint: Mutex<Option<String>>,
    store: Arc<FakeStore>,
}

impl FakeMember {
    pub(crate) fn new(key: &str, store: &Arc<FakeStore>) -> Arc<Self> {
        Arc::new(FakeMember {
            key: key.to_string(),
            available: AtomicBool::new(true),
            availability_checks: AtomicUsize::new(0),
            role: Mutex::new(MemberRole::Unknown),
            endpoint: Mutex::new(None),
            reported_primary_endpoint: Mutex::new(None),
            store: store.clone(),
        })
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub(crate) fn set_role(&self, role: MemberRole) {
        *self.role.lock().unwrap() = role;
    }

    pub(crate) fn set_endpoint(&self, endpoint: &str) {
        *self.endpoint.lock().unwrap() = Some(endpoint.to_string());
    }

    pub(crate) fn set_reported_primary_endpoint(&self, endpoint: &str) {
        *self.reported_primary_endpoint.lock().unwrap() = Some(endpoint.to_string());
    }

    /// How many times a task has looked at this member's availability. Each protocol task run
    /// checks it exactly once, so this doubles as a run counter.
    pub(crate) fn availability_checks(&self) -> usize {
        self.availability_checks.load(Ordering::SeqCst)
    }
}

impl ReplicaSetMember for FakeMember {
    fn key(&self) -> &str {
        &self.key
    }

    fn is_available(&self) -> bool {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }

    fn role(&self) -> MemberRole {
        *self.role.lock().unwrap()
    }

    fn client(&self) -> Arc<dyn ReplicatedStoreClient> {
        Arc::new(FakeStoreClient {
            store: self.store.clone(),
            via: self.key.clone(),
        })
    }

    fn endpoint(&self) -> Option<String> {
        self.endpoint.lock().unwrap().clone()
    }

    fn reported_primary_endpoint(&self) -> Option<String> {
        self.reported_primary_endpoint.lock().unwrap().clone()
    }
}

/// Pretends to provision instantly. Records every size it was asked for.
pub(crate) struct FakeScaler {
    current_size: AtomicUsize,
    requests: Mutex<Vec<usize>>,
}

impl FakeScaler {
    pub(crate) fn new(current_size: usize) -> Arc<Self> {
        Arc::new(FakeScaler {
            current_size: AtomicUsize::new(current_size),
            requests: Mutex::new(vec![]),
        })
    }

    pub(crate) fn requests(&self) -> Vec<usize> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GroupScaler for FakeScaler {
    fn current_size(&self) -> usize {
        self.current_size.load(Ordering::SeqCst)
    }

    async fn resize(&self, desired: usize) -> Result<usize, ScaleError> {
        self.requests.lock().unwrap().push(desired);
        self.current_size.store(desired, Ordering::SeqCst);
        Ok(desired)
    }
}
