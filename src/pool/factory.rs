//! Capabilities the pool needs from its container backend.

/// Boxed error returned by factories and containers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A sandbox produced by a [`ContainerFactory`].
pub trait Container: Send + 'static {
    /// Boot the container, optionally waiting until its network is up.
    fn start(&mut self, wait_for_network: bool) -> Result<(), BoxError>;

    /// Tear the container down.
    fn destroy(self) -> Result<(), BoxError>;

    /// Name used in logs.
    fn name(&self) -> String {
        String::from("<unnamed>")
    }
}

/// Creates containers on behalf of the pool.
///
/// `create_container` is called from worker threads and may block for a long
/// time; the pool never interrupts it.
pub trait ContainerFactory: Send + Sync + 'static {
    type Container: Container;

    fn create_container(&self) -> Result<Self::Container, BoxError>;
}
