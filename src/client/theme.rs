use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::forms::escape_html;
use super::{HostError, Storage};

pub const STORAGE_KEY: &str = "siteTheme";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, rename = "materialIcon")]
    pub material_icon: Option<String>,
}

impl Theme {
    pub fn labelled(name: &str, label: &str) -> Self {
        Theme {
            name: name.to_owned(),
            label: Some(label.to_owned()),
            icon: None,
            material_icon: None,
        }
    }

    /// Markup placed inside the switcher button while this theme is active.
    pub fn button_html(&self) -> String {
        match (&self.label, &self.icon, &self.material_icon) {
            (Some(label), Some(icon), _) => {
                format!("<img src=\"{}\" alt=\"{}\" />", escape_html(icon), escape_html(label))
            }
            (_, _, Some(material)) => escape_html(material),
            (Some(label), _, _) => escape_html(label),
            _ => "Theme Switcher".to_owned(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThemeError {
    #[error("there must be at least two themes")]
    TooFewThemes,
    #[error("theme name cannot be empty")]
    EmptyName,
    #[error("theme {0} cannot have both icon and materialIcon")]
    IconConflict(String),
    #[error("theme {0} cannot have both label and materialIcon")]
    LabelConflict(String),
    #[error("there must be at least two preferred themes")]
    TooFewPreferred,
    #[error("preferred theme {0} does not exist")]
    UnknownPreferred(String),
}

pub trait ThemeHost: Storage {
    /// Whether `(prefers-color-scheme: dark)` matches.
    fn prefers_dark(&self) -> bool;
    /// Class currently set on the document element.
    fn root_class(&self) -> Option<String>;
    fn set_root_class(&mut self, class: &str);
    fn set_button_content(&mut self, button_id: &str, html: &str) -> Result<(), HostError>;
}

/// Cycles the document between a fixed set of themes and remembers the choice.
pub struct ThemeSwitcher<H> {
    host: H,
    button_id: String,
    themes: Vec<Theme>,
    light: String,
    dark: String,
    on_change: Option<Box<dyn FnMut(&str)>>,
}

impl<H: ThemeHost> ThemeSwitcher<H> {
    pub fn new(host: H, button_id: &str, themes: Vec<Theme>, preferred: Vec<String>) -> Result<Self, ThemeError> {
        if themes.len() < 2 {
            return Err(ThemeError::TooFewThemes);
        }
        for theme in &themes {
            if theme.name.trim().is_empty() {
                return Err(ThemeError::EmptyName);
            }
            if theme.icon.is_some() && theme.material_icon.is_some() {
                return Err(ThemeError::IconConflict(theme.name.clone()));
            }
            if theme.label.is_some() && theme.material_icon.is_some() {
                return Err(ThemeError::LabelConflict(theme.name.clone()));
            }
        }

        if preferred.len() < 2 {
            return Err(ThemeError::TooFewPreferred);
        }
        if preferred.len() > 2 {
            warn!(count = preferred.len(), "more than two preferred themes, only the first two are used");
        }
        if let Some(missing) = preferred.iter().find(|p| !themes.iter().any(|t| &t.name == *p)) {
            return Err(ThemeError::UnknownPreferred(missing.clone()));
        }

        let mut preferred = preferred.into_iter();
        let (Some(light), Some(dark)) = (preferred.next(), preferred.next()) else {
            return Err(ThemeError::TooFewPreferred);
        };

        Ok(ThemeSwitcher {
            host,
            button_id: button_id.to_owned(),
            themes,
            light,
            dark,
            on_change: None,
        })
    }

    /// `theme-switcher` button toggling between a light and a dark theme.
    pub fn with_defaults(host: H) -> Result<Self, ThemeError> {
        let themes = vec![Theme::labelled("light", "Light Theme"), Theme::labelled("dark", "Dark Theme")];
        Self::new(host, "theme-switcher", themes, vec!["light".into(), "dark".into()])
    }

    pub fn on_theme_change(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn current(&self) -> Option<String> {
        self.host.root_class()
    }

    fn preferred(&self) -> &str {
        if self.host.prefers_dark() { &self.dark } else { &self.light }
    }

    fn set_theme(&mut self, name: &str) -> bool {
        if !self.themes.iter().any(|t| t.name == name) {
            return false;
        }
        self.host.set_root_class(name);
        self.host.storage_set(STORAGE_KEY, name);
        if let Some(callback) = &mut self.on_change {
            callback(name);
        }
        true
    }

    fn update_button(&mut self) {
        let Some(current) = self.host.root_class() else {
            return;
        };
        let Some(theme) = self.themes.iter().find(|t| t.name == current) else {
            return;
        };
        let html = theme.button_html();
        if let Err(e) = self.host.set_button_content(&self.button_id, &html) {
            debug!(error = %e, "theme switcher button not on page");
        }
    }

    /// Applies the stored theme, or the one matching the color-scheme preference.
    pub fn init(&mut self) {
        let stored = self.host.storage_get(STORAGE_KEY);
        let applied = stored.as_deref().is_some_and(|name| self.set_theme(name));
        if !applied {
            if let Some(name) = stored {
                debug!(theme = %name, "ignoring unknown stored theme");
            }
            let name = self.preferred().to_owned();
            self.set_theme(&name);
        }
        self.update_button();
    }

    /// Moves to the next theme in order, wrapping around. Returns the new theme.
    pub fn toggle(&mut self) -> Option<String> {
        let current = self.host.root_class()?;
        let idx = self.themes.iter().position(|t| t.name == current)?;
        let next = self.themes[(idx + 1) % self.themes.len()].name.clone();
        self.set_theme(&next);
        self.update_button();
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::client::testing::FakeHost;

    fn host_with_button() -> FakeHost {
        let mut host = FakeHost::new("/");
        host.buttons.insert("theme-switcher".into(), String::new());
        host
    }

    #[test]
    fn validation_rejects_bad_tables() {
        let one = vec![Theme::labelled("light", "Light")];
        let err = ThemeSwitcher::new(FakeHost::new("/"), "b", one, vec![]).err();
        assert_eq!(err, Some(ThemeError::TooFewThemes));

        let mut conflicted = Theme::labelled("dark", "Dark");
        conflicted.material_icon = Some("dark_mode".into());
        let themes = vec![Theme::labelled("light", "Light"), conflicted];
        let err = ThemeSwitcher::new(FakeHost::new("/"), "b", themes, vec!["light".into(), "dark".into()]).err();
        assert_eq!(err, Some(ThemeError::LabelConflict("dark".into())));

        let themes = vec![Theme::labelled("light", "Light"), Theme::labelled("dark", "Dark")];
        let err = ThemeSwitcher::new(FakeHost::new("/"), "b", themes.clone(), vec!["light".into()]).err();
        assert_eq!(err, Some(ThemeError::TooFewPreferred));

        let err = ThemeSwitcher::new(FakeHost::new("/"), "b", themes, vec!["light".into(), "sepia".into()]).err();
        assert_eq!(err, Some(ThemeError::UnknownPreferred("sepia".into())));
    }

    #[test]
    fn init_follows_color_scheme() {
        let mut host = host_with_button();
        host.dark = true;
        let mut switcher = ThemeSwitcher::with_defaults(host).unwrap();
        switcher.init();

        assert_eq!(switcher.current().as_deref(), Some("dark"));
        assert_eq!(switcher.host().storage[STORAGE_KEY], "dark");
        assert_eq!(switcher.host().buttons["theme-switcher"], "Dark Theme");
    }

    #[test]
    fn init_prefers_stored_theme() {
        let mut host = host_with_button();
        host.storage.insert(STORAGE_KEY.into(), "dark".into());
        let mut switcher = ThemeSwitcher::with_defaults(host).unwrap();
        switcher.init();
        assert_eq!(switcher.current().as_deref(), Some("dark"));

        let mut host = host_with_button();
        host.storage.insert(STORAGE_KEY.into(), "neon".into());
        let mut switcher = ThemeSwitcher::with_defaults(host).unwrap();
        switcher.init();
        assert_eq!(switcher.current().as_deref(), Some("light"));
    }

    #[test]
    fn toggle_cycles_and_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut switcher = ThemeSwitcher::with_defaults(host_with_button())
            .unwrap()
            .on_theme_change(move |name| sink.borrow_mut().push(name.to_owned()));

        switcher.init();
        assert_eq!(switcher.toggle().as_deref(), Some("dark"));
        assert_eq!(switcher.toggle().as_deref(), Some("light"));
        assert_eq!(*seen.borrow(), vec!["light", "dark", "light"]);
        assert_eq!(switcher.host().storage[STORAGE_KEY], "light");
    }

    #[test]
    fn toggle_without_known_theme_does_nothing() {
        let mut switcher = ThemeSwitcher::with_defaults(FakeHost::new("/")).unwrap();
        assert_eq!(switcher.toggle(), None);
        assert!(switcher.host().storage.is_empty());
    }

    #[test]
    fn button_markup_by_theme_shape() {
        let mut theme = Theme::labelled("dark", "Dark");
        theme.icon = Some("/img/moon.svg".into());
        assert_eq!(theme.button_html(), "<img src=\"/img/moon.svg\" alt=\"Dark\" />");

        let material = Theme {
            name: "dark".into(),
            label: None,
            icon: None,
            material_icon: Some("dark_mode".into()),
        };
        assert_eq!(material.button_html(), "dark_mode");

        let bare = Theme {
            name: "dark".into(),
            label: None,
            icon: None,
            material_icon: None,
        };
        assert_eq!(bare.button_html(), "Theme Switcher");
    }
}
