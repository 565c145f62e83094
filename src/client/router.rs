//! Single-page router.
//!
//! Owns the current route and locale, turns router-link clicks into history
//! pushes plus fragment swaps, and keeps locale links, translations and
//! alternate-language tags in step with whatever is on screen.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::locale::{self, Dictionary, Locale, Locales};
use super::{FetchResponse, Host, HostError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Route {
    #[serde(alias = "route")]
    pub path: String,
    pub component: String,
    #[serde(default)]
    pub default: bool,
}

impl Route {
    pub fn new(path: &str, component: &str) -> Self {
        Route {
            path: path.to_owned(),
            component: component.to_owned(),
            default: false,
        }
    }

    pub fn default_route(path: &str, component: &str) -> Self {
        Route {
            default: true,
            ..Route::new(path, component)
        }
    }

    /// `/about` for `about`, `/about/`, `/about`; `/` for an empty path.
    pub fn normalized_path(&self) -> String {
        format!("/{}", self.path.trim_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct LocaleConfig {
    pub locales: Vec<Locale>,
    pub switcher_class: String,
    pub dictionary_base: String,
    pub marker_attribute: String,
    /// Preference key in storage; `None` disables remembering the choice.
    pub storage_key: Option<String>,
    /// Prepended to alternate-link hrefs, e.g. `https://wishes.example`.
    pub origin: String,
}

impl LocaleConfig {
    pub fn new(locales: Vec<Locale>) -> Self {
        LocaleConfig {
            locales,
            switcher_class: "languageSwitcher".into(),
            dictionary_base: "/assets/lang".into(),
            marker_attribute: "data-lang-id".into(),
            storage_key: Some("siteLanguage".into()),
            origin: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub root_id: String,
    pub routes: Vec<Route>,
    pub link_class: String,
    pub fragment_base: String,
    pub locales: Option<LocaleConfig>,
}

impl RouterConfig {
    pub fn new(root_id: &str, routes: Vec<Route>) -> Self {
        RouterConfig {
            root_id: root_id.to_owned(),
            routes,
            link_class: "routerLink".into(),
            fragment_base: "/pages".into(),
            locales: None,
        }
    }

    pub fn with_locales(mut self, locales: LocaleConfig) -> Self {
        self.locales = Some(locales);
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("root element id is required")]
    MissingRoot,
    #[error("router link class is required")]
    MissingLinkClass,
    #[error("expected exactly one default route, found {0}")]
    DefaultRoutes(usize),
    #[error("no locales configured")]
    NoLocales,
    #[error("expected exactly one default locale, found {0}")]
    DefaultLocales(usize),
    #[error("locale {0} is configured more than once")]
    DuplicateLocale(String),
    #[error("unknown locale {0}")]
    UnknownLocale(String),
    #[error("locale support is not enabled")]
    LocalesDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Uninitialized,
    ResolvingLocale,
    Rendering { seq: u64 },
    Idle,
}

/// A fragment request handed out by [`Router::begin_navigation`]. Only the
/// most recently issued ticket may write into the root container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub seq: u64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Rendered,
    Superseded,
    Reloaded,
}

/// What the host knows about a clicked element.
#[derive(Debug, Clone, Default)]
pub struct ClickTarget {
    pub classes: Vec<String>,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    Navigate(String),
    SwitchLocale(String),
}

struct LocaleState {
    table: Locales,
    config: LocaleConfig,
    current: String,
    dictionary: Option<Dictionary>,
}

pub struct Router<H> {
    host: H,
    root_id: String,
    link_class: String,
    fragment_base: String,
    routes: Vec<Route>,
    default_route: usize,
    current_route: usize,
    locale: Option<LocaleState>,
    state: RouterState,
    latest_seq: u64,
}

impl<H: Host> Router<H> {
    pub fn new(config: RouterConfig, host: H) -> Result<Self, RouterError> {
        if config.root_id.trim().is_empty() {
            return Err(RouterError::MissingRoot);
        }
        if config.link_class.trim().is_empty() {
            return Err(RouterError::MissingLinkClass);
        }

        let defaults: Vec<usize> = config
            .routes
            .iter()
            .enumerate()
            .filter(|(_, r)| r.default)
            .map(|(i, _)| i)
            .collect();
        let default_route = match defaults.as_slice() {
            [only] => *only,
            other => return Err(RouterError::DefaultRoutes(other.len())),
        };

        let locale = match config.locales {
            Some(cfg) => {
                let table = Locales::new(cfg.locales.clone())?;
                Some(LocaleState {
                    current: table.default_code().to_owned(),
                    table,
                    config: cfg,
                    dictionary: None,
                })
            }
            None => None,
        };

        Ok(Router {
            host,
            root_id: config.root_id,
            link_class: config.link_class,
            fragment_base: config.fragment_base,
            routes: config.routes,
            default_route,
            current_route: default_route,
            locale,
            state: RouterState::Uninitialized,
            latest_seq: 0,
        })
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn current_route(&self) -> &Route {
        &self.routes[self.current_route]
    }

    pub fn current_locale(&self) -> Option<&str> {
        self.locale.as_ref().map(|l| l.current.as_str())
    }

    pub fn dictionary(&self) -> Option<&Dictionary> {
        self.locale.as_ref().and_then(|l| l.dictionary.as_ref())
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The route a location path renders, locale prefix, query and fragment ignored.
    pub fn resolve(&self, path: &str) -> &Route {
        &self.routes[self.route_index(path)]
    }

    fn route_index(&self, path: &str) -> usize {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let rest = match &self.locale {
            Some(l) => l.table.split_prefix(path).1,
            None => path,
        };
        let key = rest.trim_matches('/');
        if key.is_empty() {
            return self.default_route;
        }
        self.routes
            .iter()
            .position(|r| r.path.trim_matches('/') == key)
            .unwrap_or(self.default_route)
    }

    /// Path shown in the address bar for a route, prefixed with the current locale.
    fn display_path(&self, idx: usize) -> String {
        let path = self.routes[idx].normalized_path();
        match &self.locale {
            Some(l) => locale::localized(&l.current, &path),
            None => path,
        }
    }

    fn fragment_url(&self, idx: usize) -> String {
        format!(
            "{}/{}.html",
            self.fragment_base.trim_end_matches('/'),
            self.routes[idx].component
        )
    }

    fn issue(&mut self, idx: usize) -> Navigation {
        self.latest_seq += 1;
        self.current_route = idx;
        self.state = RouterState::Rendering { seq: self.latest_seq };
        Navigation {
            seq: self.latest_seq,
            url: self.fragment_url(idx),
        }
    }

    /// Initial render on page load.
    pub async fn start(&mut self) -> NavigationOutcome {
        let path = self.host.location_path();

        if let Some(l) = &mut self.locale {
            self.state = RouterState::ResolvingLocale;
            let stored = l.config.storage_key.as_deref().and_then(|key| self.host.storage_get(key));
            let (code, source) = l.table.resolve(&path, stored.as_deref(), &self.host.languages());
            info!(locale = %code, source = ?source, "resolved locale");
            if let Some(key) = &l.config.storage_key {
                self.host.storage_set(key, &code);
            }
            l.current = code;
            self.load_dictionary().await;
        }

        let idx = self.route_index(&path);
        let canonical = self.display_path(idx);
        if canonical != path {
            self.host.replace_state(&canonical);
        }

        let nav = self.issue(idx);
        let response = self.host.fetch(&nav.url).await;
        self.finish_navigation(&nav, response)
    }

    /// Decides whether a click is the router's to handle. `Some` means the
    /// caller must suppress the default navigation and [`perform`](Self::perform) the action.
    pub fn intercept_click(&self, target: &ClickTarget) -> Option<ClickAction> {
        let has = |class: &str| target.classes.iter().any(|c| c == class);

        if let Some(l) = &self.locale
            && has(&l.config.switcher_class)
        {
            let code = target
                .href
                .as_deref()
                .and_then(|href| l.table.split_prefix(href).0)
                .unwrap_or_else(|| l.table.next_after(&l.current).code.as_str());
            return Some(ClickAction::SwitchLocale(code.to_owned()));
        }

        if has(&self.link_class) {
            let href = target.href.clone().unwrap_or_default();
            return Some(ClickAction::Navigate(href));
        }
        None
    }

    pub async fn perform(&mut self, action: ClickAction) -> Result<NavigationOutcome, RouterError> {
        match action {
            ClickAction::Navigate(path) => Ok(self.navigate(&path).await),
            ClickAction::SwitchLocale(code) => self.set_locale(&code).await,
        }
    }

    /// Points the router at `path`, pushes it onto history and hands out the
    /// fragment request for it. Any earlier ticket becomes stale.
    pub fn begin_navigation(&mut self, path: &str) -> Navigation {
        let idx = self.route_index(path);
        let shown = self.display_path(idx);
        self.host.push_state(&shown);
        debug!(path = %shown, component = %self.routes[idx].component, "navigating");
        self.issue(idx)
    }

    /// Applies a fragment response. Stale tickets are dropped without touching
    /// the document; failures reload the page.
    pub fn finish_navigation(
        &mut self,
        nav: &Navigation,
        response: Result<FetchResponse, HostError>,
    ) -> NavigationOutcome {
        if nav.seq != self.latest_seq {
            debug!(seq = nav.seq, latest = self.latest_seq, "discarding stale fragment");
            return NavigationOutcome::Superseded;
        }

        let rendered = match response {
            Ok(r) if r.is_success() => self.host.replace_children(&self.root_id, &r.body),
            Ok(r) => {
                warn!(url = %nav.url, status = r.status, "fragment request was not successful");
                Err(HostError::Network {
                    url: nav.url.clone(),
                    reason: format!("status {}", r.status),
                })
            }
            Err(e) => {
                warn!(url = %nav.url, error = %e, "could not fetch fragment");
                Err(e)
            }
        };

        self.state = RouterState::Idle;
        match rendered {
            Ok(()) => {
                self.sync_locale();
                NavigationOutcome::Rendered
            }
            Err(e) => {
                warn!(error = %e, "reloading page");
                self.host.reload();
                NavigationOutcome::Reloaded
            }
        }
    }

    pub async fn navigate(&mut self, path: &str) -> NavigationOutcome {
        let nav = self.begin_navigation(path);
        let response = self.host.fetch(&nav.url).await;
        self.finish_navigation(&nav, response)
    }

    /// Switches locale, remembers the choice and re-renders the current route under it.
    pub async fn set_locale(&mut self, code: &str) -> Result<NavigationOutcome, RouterError> {
        let Some(l) = &mut self.locale else {
            return Err(RouterError::LocalesDisabled);
        };
        let Some(code) = l.table.find(code).map(str::to_owned) else {
            return Err(RouterError::UnknownLocale(code.to_owned()));
        };
        if let Some(key) = &l.config.storage_key {
            self.host.storage_set(key, &code);
        }
        info!(locale = %code, "switching locale");
        l.current = code;
        self.load_dictionary().await;

        let path = self.routes[self.current_route].normalized_path();
        Ok(self.navigate(&path).await)
    }

    async fn load_dictionary(&mut self) {
        let Some(l) = &mut self.locale else {
            return;
        };
        let url = locale::dictionary_url(&l.config.dictionary_base, &l.current);
        l.dictionary = match self.host.fetch(&url).await {
            Ok(r) if r.is_success() => match serde_json::from_str::<Dictionary>(&r.body) {
                Ok(dictionary) => Some(dictionary),
                Err(e) => {
                    warn!(url = %url, error = %e, "locale dictionary is not valid json");
                    None
                }
            },
            Ok(r) => {
                warn!(url = %url, status = r.status, "could not load locale dictionary");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "could not load locale dictionary");
                None
            }
        };
    }

    /// Translations, switcher hrefs and alternate links for what is on screen.
    fn sync_locale(&mut self) {
        let Some(l) = &self.locale else {
            return;
        };
        let route_path = self.routes[self.current_route].normalized_path();

        if let Some(dictionary) = &l.dictionary {
            locale::apply_dictionary(&mut self.host, &l.config.marker_attribute, dictionary);
        }

        let next = l.table.next_after(&l.current);
        let href = locale::localized(&next.code, &route_path);
        for node in self.host.with_class(&l.config.switcher_class) {
            self.host.set_attribute(node, "href", &href);
            self.host.set_attribute(node, "hreflang", &next.code);
        }

        let links = l.table.alternates(&l.current, &l.config.origin, &route_path);
        self.host.set_alternate_links(&links);
    }
}
