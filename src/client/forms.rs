//! Form validation, list markup and modal state for the wishlist pages.
//!
//! User-facing text is Danish, matching the rest of the front end.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::validate;
use crate::wishlist::{Wish, Wishlist};

const MONTHS: [&str; 12] = [
    "januar", "februar", "marts", "april", "maj", "juni", "juli", "august", "september", "oktober", "november",
    "december",
];

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `24. december`
pub fn format_day_da(date: NaiveDate) -> String {
    use chrono::Datelike;
    format!("{}. {}", date.day(), MONTHS[date.month0() as usize])
}

/// `24. december 2024 kl. 18.05`, in UTC. Unparseable input is returned as is.
pub fn format_timestamp_da(raw: &str) -> String {
    use chrono::{Datelike, Timelike};
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"));
    match parsed {
        Ok(dt) => format!(
            "{} {} kl. {:02}.{:02}",
            format_day_da(dt.date()),
            dt.year(),
            dt.hour(),
            dt.minute()
        ),
        Err(_) => raw.to_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Date,
    Price,
    Link,
}

impl FieldKind {
    fn check(self, value: &str) -> Result<(), FieldError> {
        let ok = match self {
            FieldKind::Name => validate::name(value).is_ok(),
            FieldKind::Date => validate::date(value).is_ok(),
            FieldKind::Price => validate::number(value).is_ok(),
            FieldKind::Link => validate::link(value).is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(match self {
                FieldKind::Name => FieldError::Name,
                FieldKind::Date => FieldError::Date,
                FieldKind::Price => FieldError::Price,
                FieldKind::Link => FieldError::Link,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    Name,
    Date,
    Price,
    Link,
}

impl FieldError {
    pub fn message(self) -> &'static str {
        match self {
            FieldError::Required => "Dette felt skal udfyldes.",
            FieldError::Name => "Navnet er ikke gyldigt.",
            FieldError::Date => "Datoen er ikke gyldig.",
            FieldError::Price => "Prisen er ikke gyldig.",
            FieldError::Link => "Linket er ikke gyldigt.",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub kind: Option<FieldKind>,
    pub required: bool,
    pub value: String,
}

impl FormField {
    pub fn required(name: &str, kind: FieldKind) -> Self {
        FormField {
            name: name.to_owned(),
            kind: Some(kind),
            required: true,
            value: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub name: String,
    pub error: Option<FieldError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormReport {
    pub fields: Vec<FieldReport>,
}

impl FormReport {
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|f| f.error.is_none())
    }

    pub fn error_for(&self, name: &str) -> Option<FieldError> {
        self.fields.iter().find(|f| f.name == name).and_then(|f| f.error)
    }
}

/// Checks every field; each one gets an entry so stale errors can be cleared.
pub fn validate_form(fields: &[FormField]) -> FormReport {
    let fields = fields
        .iter()
        .map(|field| {
            let error = if field.value.is_empty() {
                field.required.then_some(FieldError::Required)
            } else {
                field.kind.and_then(|kind| kind.check(&field.value).err())
            };
            FieldReport {
                name: field.name.clone(),
                error,
            }
        })
        .collect();
    FormReport { fields }
}

pub fn render_wishlists(wishlists: &[Wishlist]) -> String {
    wishlists
        .iter()
        .map(|w| {
            let day = validate::date(&w.wishlist_date)
                .map(format_day_da)
                .unwrap_or_else(|_| w.wishlist_date.clone());
            format!(
                concat!(
                    "<li>",
                    "<button class=\"iconMD\" aria-label=\"Rediger ønskeliste\" data-id=\"{id}\">settings</button>",
                    "<a href=\"wishlist.html?id={id}\">",
                    "<span class=\"date\" aria-label=\"Dato for ønskeliste\">{day}</span>",
                    "<h3>{name}</h3>",
                    "<span class=\"lastUpdated\">Sidst opdateret: {updated}</span>",
                    "</a></li>"
                ),
                id = w.wishlist_id,
                day = escape_html(&day),
                name = escape_html(&w.wishlist_name),
                updated = escape_html(&format_timestamp_da(&w.wishlist_last_updated)),
            )
        })
        .collect()
}

pub fn render_wishes(wishes: &[Wish]) -> String {
    wishes
        .iter()
        .map(|w| {
            // only http(s) links make it into an href
            let href = match validate::link(&w.wish_link) {
                Ok(url) => escape_html(url.as_str()),
                Err(_) => "#".to_owned(),
            };
            format!(
                concat!(
                    "<li>",
                    "<button class=\"iconMD\" aria-label=\"Rediger ønske\" data-id=\"{id}\">settings</button>",
                    "<a href=\"{href}\" target=\"_blank\">",
                    "<h3>{name}</h3>",
                    "<span class=\"price\" aria-label=\"Pris på ønske\">{price} kr.</span>",
                    "<span class=\"lastUpdated\">Sidst opdateret: {updated}</span>",
                    "</a></li>"
                ),
                id = w.wish_id,
                href = href,
                name = escape_html(&w.wish_name),
                price = w.wish_price.floor() as i64,
                updated = escape_html(&format_timestamp_da(&w.wish_last_updated)),
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    Closed,
    Create,
    Edit { id: i64 },
}

pub const SUBMIT_CREATE: &str = "<span class=\"iconMD\"> add </span>Opret";
pub const SUBMIT_SAVE: &str = "<span class=\"iconMD\"> save </span>Gem";

/// A validated form ready to be sent: the record id when editing, plus field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: Option<i64>,
    pub values: HashMap<String, String>,
}

/// State of the create/edit dialog shared by the wishlist and wish pages.
#[derive(Debug, Clone, PartialEq)]
pub struct FormModal {
    mode: ModalMode,
    fields: Vec<FormField>,
    report: FormReport,
}

impl FormModal {
    pub fn new(fields: Vec<FormField>) -> Self {
        FormModal {
            mode: ModalMode::Closed,
            fields,
            report: FormReport::default(),
        }
    }

    pub fn for_wishlist() -> Self {
        Self::new(vec![
            FormField::required("wishlistName", FieldKind::Name),
            FormField::required("wishlistDate", FieldKind::Date),
        ])
    }

    pub fn for_wish() -> Self {
        Self::new(vec![
            FormField::required("wishName", FieldKind::Name),
            FormField::required("wishPrice", FieldKind::Price),
            FormField::required("wishLink", FieldKind::Link),
        ])
    }

    pub fn mode(&self) -> ModalMode {
        self.mode
    }

    pub fn is_hidden(&self) -> bool {
        self.mode == ModalMode::Closed
    }

    pub fn delete_visible(&self) -> bool {
        matches!(self.mode, ModalMode::Edit { .. })
    }

    pub fn submit_html(&self) -> &'static str {
        match self.mode {
            ModalMode::Edit { .. } => SUBMIT_SAVE,
            _ => SUBMIT_CREATE,
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }

    pub fn set_value(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.value = value.to_owned();
        }
    }

    /// Errors from the last failed submit.
    pub fn report(&self) -> &FormReport {
        &self.report
    }

    fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.report = FormReport::default();
    }

    pub fn open_create(&mut self) {
        self.reset();
        self.mode = ModalMode::Create;
    }

    pub fn open_edit(&mut self, id: i64, values: &[(&str, String)]) {
        self.reset();
        for (name, value) in values {
            self.set_value(name, value);
        }
        self.mode = ModalMode::Edit { id };
    }

    pub fn open_edit_wishlist(&mut self, wishlist: &Wishlist) {
        let date = validate::date(&wishlist.wishlist_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| wishlist.wishlist_date.clone());
        self.open_edit(
            wishlist.wishlist_id,
            &[("wishlistName", wishlist.wishlist_name.clone()), ("wishlistDate", date)],
        );
    }

    pub fn open_edit_wish(&mut self, wish: &Wish) {
        self.open_edit(
            wish.wish_id,
            &[
                ("wishName", wish.wish_name.clone()),
                ("wishPrice", wish.wish_price.to_string()),
                ("wishLink", wish.wish_link.clone()),
            ],
        );
    }

    pub fn close(&mut self) {
        self.reset();
        self.mode = ModalMode::Closed;
    }

    pub fn submit(&mut self) -> Result<Submission, FormReport> {
        let report = validate_form(&self.fields);
        if !report.is_valid() {
            self.report = report.clone();
            return Err(report);
        }
        self.report = report;
        let id = match self.mode {
            ModalMode::Edit { id } => Some(id),
            _ => None,
        };
        let values = self.fields.iter().map(|f| (f.name.clone(), f.value.clone())).collect();
        Ok(Submission { id, values })
    }
}
