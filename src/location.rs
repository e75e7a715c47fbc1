//! Persistence sink: the page address. Reads the current query string on load
//! and replaces (never pushes) the visible address after every change.

use std::cell::RefCell;

use thiserror::Error;
use wasm_bindgen::JsValue;
use web_sys::{History, Window};

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("browser address unavailable: {0}")]
    Unavailable(&'static str),
    #[error("history.replaceState failed: {0}")]
    Replace(String),
}

fn js_message(v: &JsValue) -> String {
    v.as_string().unwrap_or_else(|| format!("{v:?}"))
}

pub trait Location {
    /// Raw query string without the leading `?`, or `None` when there is none.
    fn query(&self) -> Option<String>;
    /// Replace the current address so it carries `query`. No navigation.
    fn replace(&self, query: &str) -> Result<(), LocationError>;
}

/// `window.location` + `window.history`.
pub struct BrowserLocation {
    window: Window,
}

impl BrowserLocation {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn history(&self) -> Result<History, LocationError> {
        self.window
            .history()
            .map_err(|_| LocationError::Unavailable("window.history"))
    }

    /// `scheme://host/path` of the current page.
    fn base_url(&self) -> Result<String, LocationError> {
        let loc = self.window.location();
        let part = |r: Result<String, JsValue>, what: &'static str| {
            r.map_err(|_| LocationError::Unavailable(what))
        };
        let protocol = part(loc.protocol(), "location.protocol")?;
        let host = part(loc.host(), "location.host")?;
        let path = part(loc.pathname(), "location.pathname")?;
        Ok(format!("{protocol}//{host}{path}"))
    }
}

impl Location for BrowserLocation {
    fn query(&self) -> Option<String> {
        let search = self.window.location().search().ok()?;
        let q = search.strip_prefix('?').unwrap_or(&search);
        if q.is_empty() { None } else { Some(q.to_string()) }
    }

    fn replace(&self, query: &str) -> Result<(), LocationError> {
        let history = self.history()?;
        let url = format!("{}?{}", self.base_url()?, query);
        history
            .replace_state_with_url(&JsValue::NULL, "", Some(&url))
            .map_err(|e| LocationError::Replace(js_message(&e)))
    }
}

/// In-memory sink for hosts without a browser address bar, and for tests.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    current: RefCell<Option<String>>,
    replaced: RefCell<usize>,
}

impl MemoryLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: &str) -> Self {
        let q = query.strip_prefix('?').unwrap_or(query);
        Self {
            current: RefCell::new((!q.is_empty()).then(|| q.to_string())),
            replaced: RefCell::new(0),
        }
    }

    /// How many times the address has been replaced.
    pub fn replace_count(&self) -> usize {
        *self.replaced.borrow()
    }
}

impl Location for MemoryLocation {
    fn query(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    fn replace(&self, query: &str) -> Result<(), LocationError> {
        *self.current.borrow_mut() = Some(query.to_string());
        *self.replaced.borrow_mut() += 1;
        Ok(())
    }
}
