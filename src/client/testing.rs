use std::cell::RefCell;
use std::collections::HashMap;

use super::{AlternateLink, Browser, Document, Fetch, FetchResponse, HostError, NodeId, Storage, ThemeHost};

#[derive(Debug, Default, Clone)]
pub struct FakeNode {
    pub attrs: HashMap<String, String>,
    pub classes: Vec<String>,
    pub content: String,
}

/// In-memory browser: a flat list of pre-registered elements, a history log
/// and canned fetch responses keyed by URL.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub path: String,
    pub languages: Vec<String>,
    pub storage: HashMap<String, String>,
    pub history: Vec<String>,
    pub replaced: Vec<String>,
    pub reloads: usize,
    pub containers: HashMap<String, String>,
    pub nodes: Vec<FakeNode>,
    pub alternates: Vec<AlternateLink>,
    pub responses: HashMap<String, FetchResponse>,
    pub fetched: RefCell<Vec<String>>,
    pub dark: bool,
    pub root_class: Option<String>,
    pub buttons: HashMap<String, String>,
}

impl FakeHost {
    pub fn new(path: &str) -> Self {
        let mut host = FakeHost {
            path: path.to_owned(),
            ..Default::default()
        };
        host.containers.insert("app".into(), String::new());
        host
    }

    pub fn respond(&mut self, url: &str, status: u16, body: &str) {
        self.responses.insert(
            url.to_owned(),
            FetchResponse {
                status,
                body: body.to_owned(),
            },
        );
    }

    pub fn add_marked(&mut self, attribute: &str, value: &str) -> NodeId {
        let mut node = FakeNode::default();
        node.attrs.insert(attribute.to_owned(), value.to_owned());
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_classed(&mut self, class: &str) -> NodeId {
        self.nodes.push(FakeNode {
            classes: vec![class.to_owned()],
            ..Default::default()
        });
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &FakeNode {
        &self.nodes[id]
    }

    pub fn container(&self, id: &str) -> &str {
        self.containers.get(id).map(String::as_str).unwrap_or_default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.borrow().len()
    }
}

impl Storage for FakeHost {
    fn storage_get(&self, key: &str) -> Option<String> {
        self.storage.get(key).cloned()
    }

    fn storage_set(&mut self, key: &str, value: &str) {
        self.storage.insert(key.to_owned(), value.to_owned());
    }
}

impl Browser for FakeHost {
    fn location_path(&self) -> String {
        self.path.clone()
    }

    fn languages(&self) -> Vec<String> {
        self.languages.clone()
    }

    fn push_state(&mut self, path: &str) {
        self.history.push(path.to_owned());
        self.path = path.to_owned();
    }

    fn replace_state(&mut self, path: &str) {
        self.replaced.push(path.to_owned());
        self.path = path.to_owned();
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}

impl Document for FakeHost {
    fn replace_children(&mut self, element_id: &str, html: &str) -> Result<(), HostError> {
        match self.containers.get_mut(element_id) {
            Some(slot) => {
                *slot = html.to_owned();
                Ok(())
            }
            None => Err(HostError::MissingElement(element_id.to_owned())),
        }
    }

    fn marked(&self, attribute: &str) -> Vec<(NodeId, String)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.attrs.get(attribute).map(|v| (i, v.clone())))
            .collect()
    }

    fn with_class(&self, class: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.classes.iter().any(|c| c == class))
            .map(|(i, _)| i)
            .collect()
    }

    fn set_content(&mut self, node: NodeId, html: &str) {
        self.nodes[node].content = html.to_owned();
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node].attrs.insert(name.to_owned(), value.to_owned());
    }

    fn set_alternate_links(&mut self, links: &[AlternateLink]) {
        self.alternates = links.to_vec();
    }
}

impl Fetch for FakeHost {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, HostError> {
        self.fetched.borrow_mut().push(url.to_owned());
        self.responses.get(url).cloned().ok_or_else(|| HostError::Network {
            url: url.to_owned(),
            reason: "connection refused".into(),
        })
    }
}

impl ThemeHost for FakeHost {
    fn prefers_dark(&self) -> bool {
        self.dark
    }

    fn root_class(&self) -> Option<String> {
        self.root_class.clone()
    }

    fn set_root_class(&mut self, class: &str) {
        self.root_class = Some(class.to_owned());
    }

    fn set_button_content(&mut self, button_id: &str, html: &str) -> Result<(), HostError> {
        match self.buttons.get_mut(button_id) {
            Some(slot) => {
                *slot = html.to_owned();
                Ok(())
            }
            None => Err(HostError::MissingElement(button_id.to_owned())),
        }
    }
}
