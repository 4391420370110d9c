use async_trait::async_trait;

use crate::application::errors::ControllerError;
use crate::domain::entities::{EndpointInfo, FabricSummary, MoAttributes, NeighborMap, ProcessEntity};

/// Node filter meaning "every node in the fabric"
pub const ALL_NODES: &str = "all";

/// Controller trait - read-only view of the fabric controller
#[async_trait]
pub trait Controller: Send + Sync {
    /// Authenticate and store a fresh token
    async fn login(&self) -> Result<(), ControllerError>;

    /// Current session token
    fn token(&self) -> String;

    async fn process_entities(&self) -> Result<Vec<ProcessEntity>, ControllerError>;

    async fn fabric_summary(&self) -> Result<FabricSummary, ControllerError>;

    async fn endpoint_info(&self, mac: &str) -> Result<Vec<EndpointInfo>, ControllerError>;

    /// Neighbours seen by `node`, or by every node when given [`ALL_NODES`]
    async fn neighbors(&self, node: &str) -> Result<NeighborMap, ControllerError>;

    async fn latest_faults(&self, count: u32) -> Result<Vec<MoAttributes>, ControllerError>;

    async fn latest_events(
        &self,
        count: u32,
        user: Option<&str>,
    ) -> Result<Vec<MoAttributes>, ControllerError>;

    /// Subscribe to change events of a class, returning the subscription id
    async fn subscribe_to_class(&self, class: &str) -> Result<String, ControllerError>;

    async fn refresh_subscription(&self, subscription_id: &str) -> Result<(), ControllerError>;
}
