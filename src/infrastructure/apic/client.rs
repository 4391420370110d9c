//! APIC REST client

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;

use crate::application::errors::ControllerError;
use crate::domain::entities::{
    EndpointInfo, FabricNode, FabricSummary, MoAttributes, NeighborMap, Pod, ProcessEntity,
};
use crate::domain::traits::{Controller, ALL_NODES};
use super::mo::{decode_objects, get_path, get_rn, ImdataReply, ManagedObject};

const LOGIN_PATH: &str = "/api/aaaLogin.json";

/// Seconds the controller keeps an unrefreshed subscription alive
const SUBSCRIPTION_TIMEOUT: &str = "120";

/// Health record holding the fabric-wide average
const FABRIC_HEALTH_DN: &str = "topology/HDfabricOverallHealth5min-0";

/// Client for the APIC object model API
pub struct ApicClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    token: RwLock<String>,
}

impl ApicClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
        insecure: bool,
    ) -> Result<Self, ControllerError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            token: RwLock::new(String::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_reply(path: &str, response: Response) -> Result<ImdataReply, ControllerError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ControllerError::Auth(format!("{} rejected with {}", path, status)));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ControllerError::Api {
                status: status.as_u16(),
                path: path.to_string(),
                message,
            });
        }
        response
            .json::<ImdataReply>()
            .await
            .map_err(|e| ControllerError::Parse(format!("{}: {}", path, e)))
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ImdataReply, ControllerError> {
        tracing::debug!("GET {} {:?}", path, query);
        let response = self
            .client
            .get(self.url(path))
            .header(ACCEPT, "application/json")
            .header(COOKIE, format!("APIC-cookie={}", self.token()))
            .query(query)
            .send()
            .await?;
        Self::read_reply(path, response).await
    }

    /// Query every object of `class`
    pub async fn class(
        &self,
        class: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<ManagedObject>, ControllerError> {
        let path = format!("/api/node/class/{}.json", class);
        let reply = self.get(&path, query).await?;
        Ok(decode_objects(reply.imdata))
    }

    async fn class_attributes(
        &self,
        class: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<MoAttributes>, ControllerError> {
        Ok(self
            .class(class, query)
            .await?
            .into_iter()
            .map(|mo| mo.attributes)
            .collect())
    }
}

fn node_of(mo: &ManagedObject) -> FabricNode {
    FabricNode {
        name: mo.attr("name").to_string(),
        version: mo.attr("version").to_string(),
    }
}

#[async_trait]
impl Controller for ApicClient {
    async fn login(&self) -> Result<(), ControllerError> {
        let body = json!({
            "aaaUser": {"attributes": {"name": self.username, "pwd": self.password}}
        });
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;
        let reply = Self::read_reply(LOGIN_PATH, response).await?;

        let token = decode_objects(reply.imdata)
            .into_iter()
            .find(|mo| mo.class == "aaaLogin")
            .map(|mo| mo.attr("token").to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ControllerError::Auth("login reply carried no token".into()))?;

        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
        tracing::info!("Logged in to {} as {}", self.base_url, self.username);
        Ok(())
    }

    fn token(&self) -> String {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn process_entities(&self) -> Result<Vec<ProcessEntity>, ControllerError> {
        let procs = self.class("procEntity", &[]).await?;
        Ok(procs
            .iter()
            .map(|mo| ProcessEntity {
                node: get_rn(mo.attr("dn"), "node").unwrap_or_default().to_string(),
                cpu_pct: mo.attr("cpuPct").to_string(),
                mem_free: mo.attr("memFree").parse().unwrap_or(0.0),
                max_mem_alloc: mo.attr("maxMemAlloc").parse().unwrap_or(0.0),
            })
            .collect())
    }

    async fn fabric_summary(&self) -> Result<FabricSummary, ControllerError> {
        let banner = self.class("aaaPreLoginBanner", &[]).await?;
        let pods = self.class("fabricPod", &[]).await?;
        let nodes = self.class("fabricNode", &[]).await?;
        let health = self
            .class(
                "fabricOverallHealthHist5min",
                &[(
                    "query-target-filter",
                    format!("eq(fabricOverallHealthHist5min.dn,\"{}\")", FABRIC_HEALTH_DN),
                )],
            )
            .await?;

        let mut summary = FabricSummary {
            name: banner
                .first()
                .map(|mo| mo.attr("guiTextMessage").to_string())
                .unwrap_or_default(),
            url: self.base_url.clone(),
            health: health
                .first()
                .map(|mo| mo.attr("healthAvg").to_string())
                .unwrap_or_default(),
            pods: pods
                .iter()
                .map(|mo| Pod {
                    id: mo.attr("id").to_string(),
                    kind: mo.attr("podType").to_string(),
                })
                .collect(),
            ..FabricSummary::default()
        };

        for mo in &nodes {
            match mo.attr("role") {
                "controller" => summary.controllers.push(node_of(mo)),
                "spine" => summary.spines.push(node_of(mo)),
                "leaf" => summary.leafs.push(node_of(mo)),
                other => tracing::debug!("Ignoring fabric node role {:?}", other),
            }
        }
        Ok(summary)
    }

    async fn endpoint_info(&self, mac: &str) -> Result<Vec<EndpointInfo>, ControllerError> {
        let endpoints = self
            .class(
                "fvCEp",
                &[
                    ("query-target-filter", format!("eq(fvCEp.mac,\"{}\")", mac)),
                    ("rsp-subtree", "children".to_string()),
                    ("rsp-subtree-class", "fvIp,fvRsCEpToPathEp".to_string()),
                ],
            )
            .await?;

        let mut res = Vec::new();
        for ep in &endpoints {
            let dn = ep.attr("dn");
            // endpoints learnt outside an EPG are not reported
            let Some(epg) = get_rn(dn, "epg") else {
                continue;
            };
            let mac = match ep.attr("mac") {
                "" => mac,
                m => m,
            };
            res.push(EndpointInfo {
                mac: mac.to_string(),
                tenant: get_rn(dn, "tn").unwrap_or_default().to_string(),
                app: get_rn(dn, "ap").unwrap_or_default().to_string(),
                epg: epg.to_string(),
                ips: ep
                    .children_of("fvIp")
                    .map(|ip| ip.attr("addr").to_string())
                    .collect(),
                locations: ep
                    .children_of("fvRsCEpToPathEp")
                    .filter_map(|p| get_path(p.attr("tDn")))
                    .collect(),
            });
        }
        Ok(res)
    }

    async fn neighbors(&self, node: &str) -> Result<NeighborMap, ControllerError> {
        let mut adjacencies = self.class("cdpAdjEp", &[]).await?;
        adjacencies.extend(self.class("lldpAdjEp", &[]).await?);

        let mut neighbors = NeighborMap::new();
        for adj in &adjacencies {
            let name = match adj.attr("sysName") {
                "" => adj.attr("devId"),
                name => name,
            };
            if name.is_empty() {
                continue;
            }
            let dn = adj.attr("dn");
            let local = get_rn(dn, "node").unwrap_or_default();
            if node != ALL_NODES && node != local {
                continue;
            }
            let entry = format!("{}:{}", local, get_rn(dn, "if").unwrap_or_default());
            let ifaces = neighbors.entry(name.to_string()).or_default();
            if !ifaces.contains(&entry) {
                ifaces.push(entry);
            }
        }
        Ok(neighbors)
    }

    async fn latest_faults(&self, count: u32) -> Result<Vec<MoAttributes>, ControllerError> {
        self.class_attributes(
            "faultInst",
            &[
                ("order-by", "faultInst.lastTransition|desc".to_string()),
                ("page-size", count.to_string()),
            ],
        )
        .await
    }

    async fn latest_events(
        &self,
        count: u32,
        user: Option<&str>,
    ) -> Result<Vec<MoAttributes>, ControllerError> {
        let mut query = vec![
            ("order-by", "aaaModLR.created|desc".to_string()),
            ("page-size", count.to_string()),
        ];
        if let Some(user) = user {
            query.push(("query-target-filter", format!("eq(aaaModLR.user,\"{}\")", user)));
        }
        self.class_attributes("aaaModLR", &query).await
    }

    async fn subscribe_to_class(&self, class: &str) -> Result<String, ControllerError> {
        let path = format!("/api/class/{}.json", class);
        let reply = self
            .get(
                &path,
                &[
                    ("subscription", "yes".to_string()),
                    ("refresh-timeout", SUBSCRIPTION_TIMEOUT.to_string()),
                ],
            )
            .await?;
        let id = reply
            .subscription_id
            .ok_or_else(|| ControllerError::Parse(format!("{}: no subscriptionId in reply", path)))?;
        tracing::info!("Subscribed to class {} with id {}", class, id);
        Ok(id)
    }

    async fn refresh_subscription(&self, subscription_id: &str) -> Result<(), ControllerError> {
        self.get(
            "/api/subscriptionRefresh.json",
            &[("id", subscription_id.to_string())],
        )
        .await?;
        Ok(())
    }
}
