//! Browser-side core of the wishlist front end.
//!
//! Everything here is written against small host traits instead of a concrete
//! DOM binding, so the router, locale handling, theme switcher and form
//! helpers run the same under a WebAssembly shim, a headless test double or
//! the HTTP-backed fetcher in [`api`].

use std::future::Future;

use thiserror::Error;

pub mod api;
pub mod forms;
pub mod locale;
pub mod router;
pub mod theme;

#[cfg(test)]
pub(crate) mod testing;

pub use locale::{AlternateLink, Dictionary, Locale, Translation};
pub use router::{ClickAction, ClickTarget, LocaleConfig, NavigationOutcome, Route, Router, RouterConfig, RouterError, RouterState};
pub use theme::{Theme, ThemeError, ThemeHost, ThemeSwitcher};

/// Opaque handle to an element the host already located.
pub type NodeId = usize;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("no element with id {0}")]
    MissingElement(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Key/value persistence that survives reloads (`localStorage` in a browser).
pub trait Storage {
    fn storage_get(&self, key: &str) -> Option<String>;
    fn storage_set(&mut self, key: &str, value: &str);
}

pub trait Browser: Storage {
    /// Path component of the current location, e.g. `/da/about`.
    fn location_path(&self) -> String;
    /// Preferred languages, most preferred first (`navigator.languages`).
    fn languages(&self) -> Vec<String>;
    fn push_state(&mut self, path: &str);
    fn replace_state(&mut self, path: &str);
    fn reload(&mut self);
}

pub trait Document {
    /// Replaces the children of the element with the given id by parsed `html`.
    fn replace_children(&mut self, element_id: &str, html: &str) -> Result<(), HostError>;
    /// Elements carrying `attribute`, paired with the attribute's value.
    fn marked(&self, attribute: &str) -> Vec<(NodeId, String)>;
    fn with_class(&self, class: &str) -> Vec<NodeId>;
    fn set_content(&mut self, node: NodeId, html: &str);
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    /// Drops every `<link rel="alternate" hreflang>` in the head and inserts `links`.
    fn set_alternate_links(&mut self, links: &[AlternateLink]);
}

pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, HostError>>;
}

/// Everything the router needs from its environment.
pub trait Host: Browser + Document + Fetch {}

impl<T: Browser + Document + Fetch> Host for T {}
