//! Host capabilities the reader needs from the document it enhances.
//!
//! Every element lookup returns `Option`: a partially rendered page is normal
//! and callers skip whatever is missing.

use folio_core::{Bounds, Calendar};

/// Handle to one element on the page. Handles are cheap to clone and mutate
/// through `&self`, mirroring how the DOM itself behaves.
pub trait Element: Clone {
    fn bounds(&self) -> Bounds;

    /// Layout offset from the top of the document.
    fn offset_top(&self) -> f64;

    fn height(&self) -> f64;

    fn attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&self, name: &str, value: &str);

    fn text(&self) -> String;

    fn set_text(&self, text: &str);

    fn set_inner_html(&self, html: &str);

    fn set_class(&self, class: &str, enabled: bool);

    fn style(&self, property: &str) -> String;

    fn set_style(&self, property: &str, value: &str);

    /// Smoothly scrolls the element to the top of the viewport.
    fn scroll_into_view(&self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub height: f64,
    pub scroll_y: f64,
    pub document_height: f64,
}

pub type ClipboardCallback = Box<dyn FnOnce(Result<(), String>)>;

pub trait Page: Clone + 'static {
    type Element: Element;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    fn query_first(&self, selector: &str) -> Option<Self::Element>;

    fn query_all(&self, selector: &str) -> Vec<Self::Element>;

    /// The `<html>` element.
    fn root(&self) -> Option<Self::Element>;

    fn viewport(&self) -> Viewport;

    /// Location fragment without the leading `#`, `None` when empty.
    fn fragment(&self) -> Option<String>;

    /// Rewrites the fragment through history without reloading.
    fn push_fragment(&self, id: &str);

    fn href(&self) -> String;

    fn scroll_to_top(&self);

    fn prefers_dark(&self) -> bool;

    /// Briefly animates background colour after a theme change.
    fn theme_transition(&self);

    fn calendar(&self) -> Calendar;

    fn print(&self);

    fn alert(&self, message: &str);

    fn prompt(&self, message: &str, default: &str);

    /// Writes text to the clipboard; `done` may run later.
    fn write_clipboard(&self, text: &str, done: ClipboardCallback);
}
