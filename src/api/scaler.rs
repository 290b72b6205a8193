/// The provisioning side of the group. Growing or shrinking it is what eventually produces the
/// `on_member_added` / `on_member_removed` callbacks the controller reacts to.
#[async_trait::async_trait]
pub trait GroupScaler: Send + Sync {
    fn current_size(&self) -> usize;

    /// Start or stop instances until the group has `desired` members. Returns the resulting size.
    async fn resize(&self, desired: usize) -> Result<usize, ScaleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    #[error("Failed to provision members: {0}")]
    Provisioning(String),
}
