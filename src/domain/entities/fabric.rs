//! Records returned by the fabric controller

use std::collections::BTreeMap;

/// Raw attributes of a managed object
pub type MoAttributes = BTreeMap<String, String>;

/// CPU and memory figures of one controller node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessEntity {
    pub node: String,
    pub cpu_pct: String,
    pub mem_free: f64,
    pub max_mem_alloc: f64,
}

impl ProcessEntity {
    /// Share of allocated memory that is free, when known
    pub fn mem_free_pct(&self) -> Option<f64> {
        if self.max_mem_alloc > 0.0 {
            Some(100.0 * self.mem_free / self.max_mem_alloc)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FabricNode {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pod {
    pub id: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FabricSummary {
    pub name: String,
    pub url: String,
    pub health: String,
    pub pods: Vec<Pod>,
    pub controllers: Vec<FabricNode>,
    pub spines: Vec<FabricNode>,
    pub leafs: Vec<FabricNode>,
}

/// Where an endpoint is attached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathLocation {
    pub pod: String,
    pub nodes: String,
    pub kind: String,
    pub port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointInfo {
    pub mac: String,
    pub tenant: String,
    pub app: String,
    pub epg: String,
    pub ips: Vec<String>,
    pub locations: Vec<PathLocation>,
}

/// Neighbour system name to `node:[interface]` entries
pub type NeighborMap = std::collections::HashMap<String, Vec<String>>;
