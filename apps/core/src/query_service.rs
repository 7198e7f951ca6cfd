use crate::contract::{DisplayItem, ItemAction};
use crate::model::PeerNode;
use crate::node_cache::{Clock, StatusProvider};
use crate::status::StatusSource;

pub const OFFLINE_SUFFIX: &str = " (offline)";
pub const DEFAULT_ICON_PATH: &str = "images/tailscale-appicon.png";

/// Front-end binding point: one query in, one ordered render list out.
pub trait QueryHandler {
    fn handle_query(&mut self, query: &str, limit: usize) -> Vec<DisplayItem>;

    fn refresh(&mut self) {}
}

pub struct PeerQueryService<S, C> {
    provider: StatusProvider<S, C>,
    icon_path: String,
}

impl<S: StatusSource, C: Clock> PeerQueryService<S, C> {
    pub fn new(provider: StatusProvider<S, C>) -> Self {
        Self {
            provider,
            icon_path: DEFAULT_ICON_PATH.to_string(),
        }
    }

    pub fn with_icon_path(mut self, icon_path: impl Into<String>) -> Self {
        self.icon_path = icon_path.into();
        self
    }
}

impl<S: StatusSource, C: Clock> QueryHandler for PeerQueryService<S, C> {
    fn handle_query(&mut self, query: &str, limit: usize) -> Vec<DisplayItem> {
        let icon_path = &self.icon_path;
        let nodes = self.provider.list_nodes();
        crate::search::search(nodes, query, limit)
            .into_iter()
            .map(|node| display_item(node, icon_path))
            .collect()
    }

    fn refresh(&mut self) {
        self.provider.invalidate();
    }
}

pub fn display_label(node: &PeerNode) -> String {
    if node.online {
        node.hostname.clone()
    } else {
        format!("{}{OFFLINE_SUFFIX}", node.hostname)
    }
}

pub fn display_item(node: &PeerNode, icon_path: &str) -> DisplayItem {
    DisplayItem {
        icon: icon_path.to_string(),
        label: display_label(node),
        subtitle: node.ipv4.clone(),
        action: ItemAction::CopyToClipboard {
            text: node.ipv4.clone(),
        },
    }
}
