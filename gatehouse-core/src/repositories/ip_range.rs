//! Repository trait for the IP reputation range table.

use async_trait::async_trait;

use crate::{
    Error,
    address::SourceAddress,
    storage::{IpRangeEntry, NewIpRange},
};

/// Repository for blocked address ranges.
///
/// The login pipeline only calls [`find_active_match`](Self::find_active_match);
/// the remaining methods exist for administration.
#[async_trait]
pub trait IpRangeRepository: Send + Sync + 'static {
    /// Return an active range of the address's family that contains it, if any.
    ///
    /// Containment is inclusive and uses numeric ordering of the address.
    async fn find_active_match(
        &self,
        address: &SourceAddress,
    ) -> Result<Option<IpRangeEntry>, Error>;

    /// Add a new active range
    async fn create(&self, range: NewIpRange) -> Result<IpRangeEntry, Error>;

    /// Activate or deactivate a range, returning whether it exists
    async fn set_active(&self, id: i64, active: bool) -> Result<bool, Error>;

    /// List every range, active or not
    async fn list(&self) -> Result<Vec<IpRangeEntry>, Error>;
}
