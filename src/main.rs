use replset::{
    GroupScaler, InMemoryMember, InMemoryReplicatedStore, MembershipListener, ReplicaSetConfig, ReplicaSetMember,
    ReplicaSetOptions, ScaleError,
};
use slog::Drain;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let logger = create_root_logger_for_stdout();
    let store = InMemoryReplicatedStore::new();

    let replica_set = replset::try_create_replica_set(ReplicaSetConfig {
        name: "rs0".to_string(),
        info_logger: logger.clone(),
        scaler: Arc::new(DemoScaler::new(logger.clone(), 3)),
        options: ReplicaSetOptions {
            retry_delay: Some(Duration::from_millis(200)),
            ..ReplicaSetOptions::default()
        },
    })?;

    let nodes: Vec<Arc<InMemoryMember>> = (1..=3).map(|i| start_node(&store, i)).collect();
    for node in &nodes {
        replica_set.on_member_added(node.clone());
    }
    wait_until(|| store.configuration().len() == 3).await?;
    slog::info!(
        logger,
        "Replica set is up. Endpoints: {:?}, primary: {:?}",
        replica_set.endpoints(),
        replica_set.primary_endpoint(),
    );

    // node-1 dies, the set elects node-2, and the provisioning layer reports node-1 gone.
    nodes[0].set_available(false);
    store.elect(nodes[1].key())?;
    replica_set.on_primary_signal(nodes[1].as_ref(), true);
    replica_set.on_member_removed(nodes[0].as_ref());
    wait_until(|| store.configuration().len() == 2).await?;
    slog::info!(logger, "Failed over. Primary: {:?}", replica_set.primary_endpoint());

    if let Err(e) = replica_set.resize(4).await {
        slog::info!(logger, "Resize refused as expected: {}", e);
    }

    // Replace the lost node.
    replica_set.resize(3).await?;
    let replacement = start_node(&store, 4);
    replica_set.on_member_added(replacement.clone());
    wait_until(|| store.configuration().len() == 3).await?;
    slog::info!(
        logger,
        "Replaced lost node. Configuration: {:?}, next to evict: {:?}",
        store.configuration(),
        replica_set.removal_candidate(),
    );

    replica_set.shutdown().await;

    Ok(())
}

fn start_node(store: &InMemoryReplicatedStore, i: u8) -> Arc<InMemoryMember> {
    store.create_member(&format!("node-{}", i), &format!("10.0.0.{}:27017", i))
}

async fn wait_until<F: Fn() -> bool>(condition: F) -> Result<(), tokio::time::error::Elapsed> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}

// Pretends new nodes are provisioned by an operator. It only remembers the requested size.
struct DemoScaler {
    logger: slog::Logger,
    size: AtomicUsize,
}

impl DemoScaler {
    fn new(logger: slog::Logger, size: usize) -> Self {
        DemoScaler {
            logger,
            size: AtomicUsize::new(size),
        }
    }
}

#[async_trait::async_trait]
impl GroupScaler for DemoScaler {
    fn current_size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    async fn resize(&self, desired: usize) -> Result<usize, ScaleError> {
        slog::info!(self.logger, "Provisioning group of {} node(s)", desired);
        self.size.store(desired, Ordering::SeqCst);

        Ok(desired)
    }
}
