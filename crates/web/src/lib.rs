//! Browser binding: runs the reader against the live DOM.

use anyhow::Context as _;
use folio_application::{App, AppContext, ClipboardCallback, Element, Page, Viewport};
use folio_core::{Bounds, Calendar, ChapterList, Settings};
use folio_storage::Storage;
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, HtmlElement, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
    ScrollToOptions, Window,
};

pub mod console;
mod listeners;
mod local_storage;

pub use local_storage::LocalStorageBackend;

pub const SETTINGS_ELEMENT_ID: &str = "folio-settings";

const THEME_TRANSITION_MS: i32 = 300;

#[derive(Debug, Clone)]
pub struct DomElement(web_sys::Element);

impl DomElement {
    fn html(&self) -> Option<&HtmlElement> {
        self.0.dyn_ref::<HtmlElement>()
    }
}

impl Element for DomElement {
    fn bounds(&self) -> Bounds {
        let rect = self.0.get_bounding_client_rect();
        Bounds::new(rect.top(), rect.bottom())
    }

    fn offset_top(&self) -> f64 {
        self.html().map_or(0.0, |el| f64::from(el.offset_top()))
    }

    fn height(&self) -> f64 {
        f64::from(self.0.client_height())
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(err) = self.0.set_attribute(name, value) {
            log::warn!("set attribute {name}: {}", describe(&err));
        }
    }

    fn text(&self) -> String {
        match self.html() {
            Some(el) => el.inner_text(),
            None => self.0.text_content().unwrap_or_default(),
        }
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn set_inner_html(&self, html: &str) {
        self.0.set_inner_html(html);
    }

    fn set_class(&self, class: &str, enabled: bool) {
        let list = self.0.class_list();
        let result = if enabled {
            list.add_1(class)
        } else {
            list.remove_1(class)
        };
        if let Err(err) = result {
            log::warn!("update class {class}: {}", describe(&err));
        }
    }

    fn style(&self, property: &str) -> String {
        self.html()
            .and_then(|el| el.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&self, property: &str, value: &str) {
        let Some(el) = self.html() else {
            return;
        };
        if let Err(err) = el.style().set_property(property, value) {
            log::warn!("set style {property}: {}", describe(&err));
        }
    }

    fn scroll_into_view(&self) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        self.0
            .scroll_into_view_with_scroll_into_view_options(&options);
    }
}

#[derive(Debug, Clone)]
pub struct DomPage {
    window: Window,
    document: Document,
    locale: String,
}

impl DomPage {
    pub fn new() -> anyhow::Result<Self> {
        let window = web_sys::window().context("no global window")?;
        let document = window.document().context("window has no document")?;
        Ok(Self {
            window,
            document,
            locale: "es-ES".to_string(),
        })
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Reads `Settings` from the JSON block `#folio-settings`; defaults when absent.
    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let raw = self
            .document
            .get_element_by_id(SETTINGS_ELEMENT_ID)
            .and_then(|el| el.text_content())
            .unwrap_or_default();
        let mut settings = parse_settings(&raw)?;
        settings.normalize();
        Ok(settings)
    }
}

impl Page for DomPage {
    type Element = DomElement;

    fn element_by_id(&self, id: &str) -> Option<DomElement> {
        self.document.get_element_by_id(id).map(DomElement)
    }

    fn query_first(&self, selector: &str) -> Option<DomElement> {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .map(DomElement)
    }

    fn query_all(&self, selector: &str) -> Vec<DomElement> {
        select_all(&self.document, selector)
            .into_iter()
            .map(DomElement)
            .collect()
    }

    fn root(&self) -> Option<DomElement> {
        self.document.document_element().map(DomElement)
    }

    fn viewport(&self) -> Viewport {
        let height = self
            .window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0);
        let document_height = self
            .document
            .document_element()
            .map_or(0.0, |el| f64::from(el.scroll_height()));
        Viewport {
            height,
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
            document_height,
        }
    }

    fn fragment(&self) -> Option<String> {
        let hash = self.window.location().hash().ok()?;
        let id = hash.strip_prefix('#').unwrap_or(&hash);
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    fn push_fragment(&self, id: &str) {
        let result = self.window.history().and_then(|history| {
            history.push_state_with_url(&JsValue::NULL, "", Some(&format!("#{id}")))
        });
        if let Err(err) = result {
            log::warn!("push history state #{id}: {}", describe(&err));
        }
    }

    fn href(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn scroll_to_top(&self) {
        let options = ScrollToOptions::new();
        options.set_top(0.0);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn prefers_dark(&self) -> bool {
        matches!(
            self.window.match_media("(prefers-color-scheme: dark)"),
            Ok(Some(query)) if query.matches()
        )
    }

    fn theme_transition(&self) {
        let Some(body) = self.document.body() else {
            return;
        };
        let style = body.style();
        if style
            .set_property("transition", "background-color 0.3s ease")
            .is_err()
        {
            return;
        }
        let reset = Closure::once_into_js(move || {
            if let Err(err) = style.remove_property("transition") {
                log::warn!("reset theme transition: {}", describe(&err));
            }
        });
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                reset.unchecked_ref(),
                THEME_TRANSITION_MS,
            )
        {
            log::warn!("schedule theme transition reset: {}", describe(&err));
        }
    }

    fn calendar(&self) -> Calendar {
        let now = js_sys::Date::new_0();
        let options = js_sys::Object::new();
        for (key, value) in [
            ("weekday", "long"),
            ("year", "numeric"),
            ("month", "long"),
            ("day", "numeric"),
        ] {
            if let Err(err) = Reflect::set(&options, &JsValue::from_str(key), &JsValue::from_str(value)) {
                log::warn!("date option {key}: {}", describe(&err));
            }
        }
        Calendar {
            long_date: now.to_locale_date_string(&self.locale, &options).into(),
            short_date: now
                .to_locale_date_string(&self.locale, &JsValue::UNDEFINED)
                .into(),
            year: now.get_full_year() as i32,
        }
    }

    fn print(&self) {
        if let Err(err) = self.window.print() {
            log::warn!("print: {}", describe(&err));
        }
    }

    fn alert(&self, message: &str) {
        if let Err(err) = self.window.alert_with_message(message) {
            log::warn!("alert: {}", describe(&err));
        }
    }

    fn prompt(&self, message: &str, default: &str) {
        if let Err(err) = self.window.prompt_with_message_and_default(message, default) {
            log::warn!("prompt: {}", describe(&err));
        }
    }

    fn write_clipboard(&self, text: &str, done: ClipboardCallback) {
        let promise = match clipboard_write(&self.window, text) {
            Ok(promise) => promise,
            Err(err) => {
                done(Err(err));
                return;
            }
        };
        wasm_bindgen_futures::spawn_local(async move {
            let result = JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|err| describe(&err));
            done(result);
        });
    }
}

fn clipboard_write(window: &Window, text: &str) -> Result<Promise, String> {
    let navigator = window.navigator();
    let clipboard =
        Reflect::get(&navigator, &JsValue::from_str("clipboard")).map_err(|err| describe(&err))?;
    if clipboard.is_undefined() || clipboard.is_null() {
        return Err("clipboard API unavailable".to_string());
    }
    let write = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .map_err(|err| describe(&err))?
        .dyn_into::<Function>()
        .map_err(|_| "clipboard.writeText is not callable".to_string())?;
    write
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(|err| describe(&err))?
        .dyn_into::<Promise>()
        .map_err(|_| "clipboard.writeText returned no promise".to_string())
}

pub(crate) fn select_all(document: &Document, selector: &str) -> Vec<web_sys::Element> {
    let Ok(nodes) = document.query_selector_all(selector) else {
        log::warn!("invalid selector {selector}");
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|idx| nodes.get(idx))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .collect()
}

pub(crate) fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub(crate) fn js_error(value: JsValue) -> anyhow::Error {
    anyhow::anyhow!(describe(&value))
}

fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    if raw.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_json::from_str(raw).with_context(|| format!("parse #{SETTINGS_ELEMENT_ID} settings"))
}

fn chapter_list(settings: &Settings) -> ChapterList {
    match settings.chapter_list() {
        Ok(chapters) => chapters,
        Err(err) => {
            log::warn!("{err}, falling back to the default chapter list");
            ChapterList::default()
        }
    }
}

/// Starts the reader once the document has been parsed.
pub fn boot() -> anyhow::Result<()> {
    let page = DomPage::new()?;
    if page.document().ready_state() != "loading" {
        return start(page);
    }

    let document = page.document().clone();
    let mut pending = Some(page);
    listeners::listen(&document, "DOMContentLoaded", move |_| {
        if let Some(page) = pending.take()
            && let Err(err) = start(page)
        {
            log::error!("{err:?}");
        }
    })
}

fn start(page: DomPage) -> anyhow::Result<()> {
    log::info!("starting reader");
    let settings = page.load_settings()?;
    console::set_level(&settings.log_level);

    let chapters = chapter_list(&settings);
    let chapter_count = chapters.len();
    let page = page.with_locale(settings.locale.clone());
    let storage = match LocalStorageBackend::open(page.window()) {
        Ok(backend) => Some(Storage::new(backend)),
        Err(err) => {
            log::warn!("{err:#}");
            None
        }
    };

    let ctx = AppContext::new(settings, chapters, page).with_storage(storage);
    listeners::install(App::new(ctx))?;
    log::info!("reader ready with {chapter_count} chapters");
    Ok(())
}
