//! The block storage reader capability

use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Opaque per-block descriptor as returned by a block listing
pub type BlockDescriptor = Vec<u8>;

/// Read access to tenant block storage.
///
/// Implemented both by direct storage backends and by caching layers that
/// wrap another `Reader`, so callers never need to know which one they hold.
#[async_trait]
pub trait Reader: Send + Sync {
    /// List all tenants with stored blocks
    async fn tenants(&self) -> Result<Vec<String>>;

    /// List the descriptors of every block owned by a tenant
    async fn blocklist(&self, tenant_id: &str) -> Result<Vec<BlockDescriptor>>;

    /// Fetch the bloom filter of a block
    async fn bloom(&self, block_id: Uuid, tenant_id: &str) -> Result<Vec<u8>>;

    /// Fetch the index of a block
    async fn index(&self, block_id: Uuid, tenant_id: &str) -> Result<Vec<u8>>;

    /// Fetch `length` bytes of block data starting at `start`
    async fn object(
        &self,
        block_id: Uuid,
        tenant_id: &str,
        start: u64,
        length: u32,
    ) -> Result<Vec<u8>>;

    /// Release background resources held by the reader
    async fn shutdown(&self) {}
}
