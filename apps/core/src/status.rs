use std::fmt::{Display, Formatter};
use std::process::{Command, Stdio};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::{first_ipv4, PeerNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    Launch { command: String, message: String },
    ExitStatus { code: Option<i32>, stderr: String },
    InvalidUtf8,
    Parse(String),
}

impl Display for StatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Launch { command, message } => {
                write!(f, "failed to launch '{command}': {message}")
            }
            Self::ExitStatus { code: Some(code), stderr } => {
                write!(f, "status command exited with code {code}: {stderr}")
            }
            Self::ExitStatus { code: None, stderr } => {
                write!(f, "status command failed without exit code: {stderr}")
            }
            Self::InvalidUtf8 => write!(f, "status output is not valid utf-8"),
            Self::Parse(message) => write!(f, "malformed status output: {message}"),
        }
    }
}

impl std::error::Error for StatusError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOutput {
    pub stdout: String,
    pub success: bool,
}

/// Source of raw `status --json` text.
pub trait StatusSource {
    fn source_name(&self) -> &str;
    fn run_status_command(&self) -> Result<StatusOutput, StatusError>;
}

pub struct TailscaleCli {
    program: String,
}

impl TailscaleCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TailscaleCli {
    fn default() -> Self {
        Self::new("tailscale")
    }
}

impl StatusSource for TailscaleCli {
    fn source_name(&self) -> &str {
        &self.program
    }

    fn run_status_command(&self) -> Result<StatusOutput, StatusError> {
        let output = Command::new(&self.program)
            .args(["status", "--json"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| StatusError::Launch {
                command: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(StatusError::ExitStatus {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| StatusError::InvalidUtf8)?;
        Ok(StatusOutput {
            stdout,
            success: true,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusDocument {
    #[serde(rename = "Self", default)]
    self_node: Option<StatusNode>,
    // Map keeps document order (serde_json `preserve_order`).
    #[serde(rename = "Peer", default)]
    peer: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct StatusNode {
    #[serde(rename = "HostName", default)]
    host_name: String,
    #[serde(rename = "TailscaleIPs", default)]
    tailscale_ips: Option<Vec<String>>,
    #[serde(rename = "Online", default)]
    online: bool,
}

impl StatusNode {
    fn into_peer_node(self) -> Option<PeerNode> {
        let ips = self.tailscale_ips.unwrap_or_default();
        let ipv4 = first_ipv4(&ips)?.to_string();
        Some(PeerNode::from_owned(self.host_name, ipv4, self.online))
    }
}

/// Parses `tailscale status --json` output. The self node comes first,
/// then peers in document order; nodes without an IPv4 address are dropped.
pub fn parse_status(raw: &str) -> Result<Vec<PeerNode>, StatusError> {
    let document: StatusDocument =
        serde_json::from_str(raw).map_err(|e| StatusError::Parse(e.to_string()))?;

    let mut nodes = Vec::new();
    if let Some(self_node) = document.self_node {
        nodes.extend(self_node.into_peer_node());
    }

    for (key, value) in document.peer.unwrap_or_default() {
        let peer = StatusNode::deserialize(&value)
            .map_err(|e| StatusError::Parse(format!("peer '{key}': {e}")))?;
        nodes.extend(peer.into_peer_node());
    }

    Ok(nodes)
}

pub fn try_fetch_nodes(source: &dyn StatusSource) -> Result<Vec<PeerNode>, StatusError> {
    let output = source.run_status_command()?;
    if !output.success {
        return Err(StatusError::ExitStatus {
            code: None,
            stderr: "unsuccessful exit".to_string(),
        });
    }
    parse_status(&output.stdout)
}

/// Never fails: any status error yields an empty list.
pub fn fetch_nodes(source: &dyn StatusSource) -> Vec<PeerNode> {
    match try_fetch_nodes(source) {
        Ok(nodes) => {
            tracing::debug!(source = source.source_name(), count = nodes.len(), "fetched nodes");
            nodes
        }
        Err(error) => {
            tracing::warn!(source = source.source_name(), %error, "status unavailable");
            Vec::new()
        }
    }
}
