//! Browser front end: renders the grid as a table, binds one click handler per
//! cell and keeps the page address in sync with the session.
//!
//! The page provides two numeric inputs (size, base), a reset button and an
//! empty container. Changing either input or pressing reset rebuilds the
//! session from the current input values.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlInputElement, MouseEvent, window};

use crate::grid::{Grid, GridConfig};
use crate::location::{BrowserLocation, Location};
use crate::session::{Session, decode, parse_base, parse_size, restore};
use crate::{DEFAULT_BASE, DEFAULT_SIZE};

/// Tables for this base and up get the `gradient` class.
const GRADIENT_MIN_BASE: u32 = 4;

/// Element ids the front end binds to.
#[derive(Clone, Debug)]
pub struct PageIds {
    pub size_input: String,
    pub base_input: String,
    pub reset_button: String,
    pub container: String,
}

impl Default for PageIds {
    fn default() -> Self {
        Self {
            size_input: "input-size".into(),
            base_input: "input-base".into(),
            reset_button: "button-reset".into(),
            container: "game".into(),
        }
    }
}

type CellListener = Closure<dyn FnMut(MouseEvent)>;

/// Rendered table. Dropping it releases the per-cell listeners.
struct GridView {
    table: Element,
    cells: Vec<Element>,
    _listeners: Vec<CellListener>,
}

impl GridView {
    fn build(doc: &Document, grid: &Grid, page: Weak<RefCell<Page>>) -> Result<Self, JsValue> {
        let table = doc.create_element("table")?;
        if grid.base() >= GRADIENT_MIN_BASE {
            table.class_list().add_1("gradient")?;
        }
        let mut cells = Vec::with_capacity(grid.cells().len());
        let mut listeners = Vec::with_capacity(grid.cells().len());
        for y in 0..grid.size() {
            let tr = doc.create_element("tr")?;
            for x in 0..grid.size() {
                let td = doc.create_element("td")?;
                td.set_attribute("class", "cell")?;
                let page = page.clone();
                let (cx, cy) = (x as i64, y as i64);
                let closure = Closure::wrap(Box::new(move |_evt: MouseEvent| {
                    if let Some(page) = page.upgrade() {
                        page.borrow_mut().click(cx, cy);
                    }
                }) as Box<dyn FnMut(_)>);
                td.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
                tr.append_child(&td)?;
                cells.push(td);
                listeners.push(closure);
            }
            table.append_child(&tr)?;
        }
        let view = Self {
            table,
            cells,
            _listeners: listeners,
        };
        view.refresh(grid)?;
        Ok(view)
    }

    fn refresh(&self, grid: &Grid) -> Result<(), JsValue> {
        for (el, cell) in self.cells.iter().zip(grid.cells()) {
            el.set_attribute("data-state", &cell.state.to_string())?;
        }
        Ok(())
    }
}

/// Page-level state shared by the event handlers.
struct Page {
    document: Document,
    container: Element,
    size_input: HtmlInputElement,
    base_input: HtmlInputElement,
    location: BrowserLocation,
    session: Session,
    view: Option<GridView>,
}

type SharedPage = Rc<RefCell<Page>>;

impl Page {
    /// Current input values, falling back to the defaults when unparsable.
    fn input_config(&self) -> GridConfig {
        let size = parse_size(&self.size_input.value()).unwrap_or_else(|e| {
            debug!(error = %e, "size input invalid, using default");
            DEFAULT_SIZE
        });
        let base = parse_base(&self.base_input.value()).unwrap_or_else(|e| {
            debug!(error = %e, "base input invalid, using default");
            DEFAULT_BASE
        });
        GridConfig::new(size, base)
    }

    fn write_inputs(&self, config: GridConfig) {
        self.size_input.set_value(&config.size.to_string());
        self.base_input.set_value(&config.base.to_string());
    }

    fn click(&mut self, x: i64, y: i64) {
        self.session.click(x, y);
        if let Some(view) = &self.view {
            if let Err(e) = view.refresh(self.session.grid()) {
                debug!(error = ?e, "cell refresh failed");
            }
        }
        self.session.persist(&self.location);
    }
}

fn input(doc: &Document, id: &str) -> Result<HtmlInputElement, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not an input")))
}

/// Replace the current session and its table, then persist.
fn show(page: &SharedPage, session: Session) -> Result<(), JsValue> {
    let view = {
        let p = page.borrow();
        GridView::build(&p.document, session.grid(), Rc::downgrade(page))?
    };
    let mut p = page.borrow_mut();
    p.container.set_inner_html("");
    p.container.append_child(&view.table)?;
    p.session = session;
    p.view = Some(view);
    p.session.persist(&p.location);
    Ok(())
}

fn reset(page: &SharedPage) -> Result<(), JsValue> {
    let config = page.borrow().input_config();
    info!(size = config.size, base = config.base, "new grid");
    show(page, Session::new(config))
}

/// Bind to the page and build the first grid, restoring it from the address
/// when a query string is present.
pub fn mount(ids: &PageIds) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let container = doc
        .get_element_by_id(&ids.container)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{}", ids.container)))?;
    let reset_button = doc
        .get_element_by_id(&ids.reset_button)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{}", ids.reset_button)))?;

    let page: SharedPage = Rc::new(RefCell::new(Page {
        size_input: input(&doc, &ids.size_input)?,
        base_input: input(&doc, &ids.base_input)?,
        document: doc,
        container,
        location: BrowserLocation::new(win),
        session: Session::new(GridConfig::default()),
        view: None,
    }));

    let initial = {
        let p = page.borrow();
        let defaults = p.input_config();
        match p.location.query() {
            Some(query) => {
                let decoded = decode(&query, defaults);
                p.write_inputs(decoded.config);
                info!(
                    size = decoded.config.size,
                    base = decoded.config.base,
                    "restoring grid from address"
                );
                Session::from(restore(&decoded))
            }
            None => Session::new(defaults),
        }
    };
    show(&page, initial)?;

    // Size / base edits and the reset button all rebuild from the inputs.
    let (size_el, base_el): (Element, Element) = {
        let p = page.borrow();
        (p.size_input.clone().into(), p.base_input.clone().into())
    };
    for (target, event) in [(size_el, "change"), (base_el, "change"), (reset_button, "click")] {
        let page = page.clone();
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            if let Err(e) = reset(&page) {
                debug!(error = ?e, "reset failed");
            }
        }) as Box<dyn FnMut(_)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}
