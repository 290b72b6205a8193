use crate::member::{MemberId, MemberRole, ReplicaSetMember, ReplicatedStoreClient, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

// A single-process stand-in for a replicated store. It does not replicate anything; it only keeps
// the set's configuration and answers the same reconfiguration calls a real store would, with
// the same preconditions.
#[derive(Clone)]
pub struct InMemoryReplicatedStore {
    state: SharedState,
}

#[derive(Clone)]
struct SharedState(Arc<Mutex<StoreState>>);

impl SharedState {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.0.lock().expect("In-memory store mutex guard poison")
    }
}

#[derive(Default)]
struct StoreState {
    set_name: Option<String>,
    configuration: BTreeMap<MemberId, String>,
    primary: Option<String>,
    nodes: HashMap<String, NodeState>,
}

struct NodeState {
    available: bool,
    endpoint: String,
}

impl StoreState {
    fn is_configured(&self, key: &str) -> bool {
        self.configuration.values().any(|configured| configured == key)
    }

    fn is_available(&self, key: &str) -> bool {
        self.nodes.get(key).map(|node| node.available).unwrap_or(false)
    }

    fn check_reachable(&self, via: &str) -> Result<(), StoreError> {
        if self.is_available(via) {
            Ok(())
        } else {
            Err(StoreError::ConnectionRefused(via.to_string()))
        }
    }

    fn check_primary(&self, via: &str) -> Result<(), StoreError> {
        self.check_reachable(via)?;
        if self.primary.as_deref() != Some(via) {
            return Err(StoreError::Rejected(format!("{} is not primary", via)));
        }

        Ok(())
    }
}

impl InMemoryReplicatedStore {
    pub fn new() -> Self {
        InMemoryReplicatedStore {
            state: SharedState(Arc::new(Mutex::new(StoreState::default()))),
        }
    }

    /// Starts a node. It is available, but not part of any replica set until it's initialized
    /// or added.
    pub fn create_member(&self, key: &str, endpoint: &str) -> Arc<InMemoryMember> {
        self.state.lock().nodes.insert(
            key.to_string(),
            NodeState {
                available: true,
                endpoint: endpoint.to_string(),
            },
        );

        Arc::new(InMemoryMember {
            key: key.to_string(),
            state: self.state.clone(),
        })
    }

    /// Simulates the set electing `key`. Only an available, configured member can win.
    pub fn elect(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.check_reachable(key)?;
        if !state.is_configured(key) {
            return Err(StoreError::Rejected(format!("{} is not a member of the set", key)));
        }

        state.primary = Some(key.to_string());
        Ok(())
    }

    /// Members of the set's configuration, ordered by ID.
    pub fn configuration(&self) -> Vec<(MemberId, String)> {
        self.state
            .lock()
            .configuration
            .iter()
            .map(|(id, key)| (*id, key.clone()))
            .collect()
    }

    pub fn primary_key(&self) -> Option<String> {
        self.state.lock().primary.clone()
    }

    pub fn set_name(&self) -> Option<String> {
        self.state.lock().set_name.clone()
    }
}

impl Default for InMemoryReplicatedStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A node of the in-memory store. Roles are derived from the store's configuration, so they
/// lag behind the controller exactly as much as the store does.
pub struct InMemoryMember {
    key: String,
    state: SharedState,
}

impl InMemoryMember {
    /// Stopping a node that is primary leaves the set without a primary until someone calls
    /// `InMemoryReplicatedStore::elect`.
    pub fn set_available(&self, available: bool) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.get_mut(&self.key) {
            node.available = available;
        }
        if !available && state.primary.as_deref() == Some(self.key.as_str()) {
            state.primary = None;
        }
    }
}

impl ReplicaSetMember for InMemoryMember {
    fn key(&self) -> &str {
        &self.key
    }

    fn is_available(&self) -> bool {
        self.state.lock().is_available(&self.key)
    }

    fn role(&self) -> MemberRole {
        let state = self.state.lock();
        if !state.is_available(&self.key) || !state.is_configured(&self.key) {
            MemberRole::Unknown
        } else if state.primary.as_deref() == Some(self.key.as_str()) {
            MemberRole::Primary
        } else {
            MemberRole::Secondary
        }
    }

    fn client(&self) -> Arc<dyn ReplicatedStoreClient> {
        Arc::new(InMemoryClient {
            via: self.key.clone(),
            state: self.state.clone(),
        })
    }

    fn endpoint(&self) -> Option<String> {
        self.state.lock().nodes.get(&self.key).map(|node| node.endpoint.clone())
    }

    fn reported_primary_endpoint(&self) -> Option<String> {
        let state = self.state.lock();
        if !state.is_available(&self.key) || !state.is_configured(&self.key) {
            return None;
        }

        let primary = state.primary.as_ref()?;
        state.nodes.get(primary).map(|node| node.endpoint.clone())
    }
}

struct InMemoryClient {
    via: String,
    state: SharedState,
}

#[async_trait::async_trait]
impl ReplicatedStoreClient for InMemoryClient {
    async fn initialize_set(&self, set_name: &str, self_id: MemberId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.check_reachable(&self.via)?;
        if let Some(existing) = &state.set_name {
            return Err(StoreError::Rejected(format!("Already initialized as {}", existing)));
        }

        state.set_name = Some(set_name.to_string());
        state.configuration.insert(self_id, self.via.clone());
        state.primary = Some(self.via.clone());
        Ok(())
    }

    async fn add_member(&self, member: &dyn ReplicaSetMember, new_id: MemberId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.check_primary(&self.via)?;
        if !state.is_available(member.key()) {
            return Err(StoreError::Rejected(format!("{} is unreachable", member.key())));
        }
        if state.is_configured(member.key()) {
            return Err(StoreError::Rejected(format!("{} is already a member", member.key())));
        }
        if let Some(holder) = state.configuration.get(&new_id) {
            return Err(StoreError::Rejected(format!("ID {} is already taken by {}", new_id, holder)));
        }

        state.configuration.insert(new_id, member.key().to_string());
        Ok(())
    }

    async fn remove_member(&self, member: &dyn ReplicaSetMember) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.check_primary(&self.via)?;
        if state.is_available(member.key()) {
            return Err(StoreError::Rejected(format!("{} is still running", member.key())));
        }

        // Removing a member that never made it into the configuration is a no-op.
        state.configuration.retain(|_, configured| configured != member.key());
        Ok(())
    }
}
