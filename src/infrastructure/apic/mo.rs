//! Managed object decoding and distinguished-name helpers

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::entities::{MoAttributes, PathLocation};

/// Body returned by every class or MO query
#[derive(Debug, Deserialize)]
pub struct ImdataReply {
    #[serde(default)]
    pub imdata: Vec<BTreeMap<String, RawObject>>,
    #[serde(default, rename = "subscriptionId")]
    pub subscription_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawObject {
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<BTreeMap<String, RawObject>>,
}

/// A decoded managed object with its children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagedObject {
    pub class: String,
    pub attributes: MoAttributes,
    pub children: Vec<ManagedObject>,
}

impl ManagedObject {
    fn from_raw(class: String, raw: RawObject) -> Self {
        let attributes = raw
            .attributes
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();
        Self {
            class,
            attributes,
            children: decode_objects(raw.children),
        }
    }

    /// Attribute value, empty when absent
    pub fn attr(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn children_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ManagedObject> {
        self.children.iter().filter(move |c| c.class == class)
    }
}

pub fn decode_objects(items: Vec<BTreeMap<String, RawObject>>) -> Vec<ManagedObject> {
    items
        .into_iter()
        .flat_map(|item| item.into_iter())
        .map(|(class, raw)| ManagedObject::from_raw(class, raw))
        .collect()
}

/// Split a dn on '/', keeping bracketed segments such as `[eth1/1]` whole
pub fn split_dn(dn: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in dn.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                parts.push(&dn[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&dn[start..]);
    parts
}

/// Value of the first relative name `<prefix>-<value>` in `dn`
pub fn get_rn<'a>(dn: &'a str, prefix: &str) -> Option<&'a str> {
    split_dn(dn).into_iter().find_map(|rn| {
        rn.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
    })
}

/// Decode an endpoint attachment path such as
/// `topology/pod-2/protpaths-1201-1202/pathep-[VPC_IPG]`
pub fn get_path(t_dn: &str) -> Option<PathLocation> {
    let pod = get_rn(t_dn, "pod")?;
    let port = get_rn(t_dn, "pathep")?;

    let (nodes, kind) = if let Some(nodes) = get_rn(t_dn, "protpaths") {
        (nodes, "vPC")
    } else if let Some(nodes) = get_rn(t_dn, "paths") {
        let kind = if port.starts_with("[eth") { "Access" } else { "PC" };
        (nodes, kind)
    } else {
        return None;
    };

    Some(PathLocation {
        pod: pod.to_string(),
        nodes: nodes.to_string(),
        kind: kind.to_string(),
        port: port.to_string(),
    })
}
