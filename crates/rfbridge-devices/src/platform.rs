//! Platform setup for RF bridge remotes.

use rfbridge_core::{Entity, EntityHost};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::RemoteError;
use crate::registry::DeviceRegistry;
use crate::remote::RemoteAdapter;

/// What device discovery hands to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInfo {
    pub deviceid: String,
}

impl DiscoveryInfo {
    pub fn new(deviceid: impl Into<String>) -> Self {
        Self {
            deviceid: deviceid.into(),
        }
    }
}

/// Create the remote entity for a discovered device and attach it to `host`.
///
/// Without discovery info nothing is set up.
pub async fn setup_platform(
    host: Arc<dyn EntityHost>,
    registry: Arc<dyn DeviceRegistry>,
    discovery_info: Option<DiscoveryInfo>,
) -> Result<Vec<Arc<RemoteAdapter>>, RemoteError> {
    let Some(info) = discovery_info else {
        tracing::debug!("Remote platform loaded without discovery info");
        return Ok(Vec::new());
    };

    let adapter = Arc::new(RemoteAdapter::new(registry, info.deviceid));
    host.add_entity(adapter.entity_id());
    adapter.added_to_host(host).await?;

    Ok(vec![adapter])
}
