//! Wires browser events into the reader's dispatcher.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context as _;
use folio_application::{App, Control, Key, PageEvent, activates};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, ErrorEvent, EventTarget, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent,
};

use crate::{DomPage, describe, js_error, select_all};

type SharedApp = Rc<RefCell<App<DomPage>>>;

const CONTROLS: [(&str, Control, bool); 8] = [
    ("#theme-toggle", Control::ThemeToggle, false),
    ("#scroll-top", Control::ScrollTop, false),
    ("#nav-toggle", Control::NavToggle, false),
    (".nav-btn.next", Control::NextChapter, false),
    (".nav-btn.prev", Control::PreviousChapter, false),
    ("#print-btn", Control::Print, true),
    ("#cite-btn", Control::Cite, true),
    ("#pdf-btn", Control::PdfExport, true),
];

const FADE_IN_SELECTOR: &str = ".section, .card, .component-card";

pub(crate) fn listen<F>(target: &EventTarget, kind: &str, handler: F) -> anyhow::Result<()>
where
    F: FnMut(web_sys::Event) + 'static,
{
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    target
        .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
        .map_err(js_error)
        .with_context(|| format!("listen for {kind}"))?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

fn dispatch(app: &SharedApp, event: PageEvent) {
    match app.try_borrow_mut() {
        Ok(mut app) => {
            app.handle(event);
        }
        Err(_) => log::warn!("reader busy, dropped {event:?}"),
    }
}

fn forward(target: &EventTarget, kind: &str, app: &SharedApp, event: PageEvent) -> anyhow::Result<()> {
    let app = app.clone();
    listen(target, kind, move |_| dispatch(&app, event))
}

/// Registers every listener, then replays the lifecycle events that already happened.
pub(crate) fn install(app: App<DomPage>) -> anyhow::Result<()> {
    let page = app.ctx.page.clone();
    let window = page.window().clone();
    let document = page.document().clone();
    let app: SharedApp = Rc::new(RefCell::new(app));

    // Each feature is wired on its own so one failure leaves the rest working.
    let setups: [(&str, anyhow::Result<()>); 7] = [
        ("scroll", forward(&window, "scroll", &app, PageEvent::Scroll)),
        ("resize", forward(&window, "resize", &app, PageEvent::Resize)),
        (
            "hashchange",
            forward(&window, "hashchange", &app, PageEvent::HashChange),
        ),
        ("keyboard", bind_arrow_keys(&document, &app)),
        ("controls", bind_controls(&document, &app)),
        ("accessibility", bind_keyboard_activation(&document)),
        ("fade-in", observe_fade_ins(&document)),
    ];
    for (name, result) in setups {
        if let Err(err) = result {
            log::error!("{name} setup failed: {err:#}");
        }
    }
    if let Err(err) = bind_diagnostics(&window) {
        log::error!("diagnostics setup failed: {err:#}");
    }

    dispatch(&app, PageEvent::Ready);
    if document.ready_state() == "complete" {
        dispatch(&app, PageEvent::Load);
    } else {
        forward(&window, "load", &app, PageEvent::Load)?;
    }
    Ok(())
}

fn bind_arrow_keys(document: &Document, app: &SharedApp) -> anyhow::Result<()> {
    let app = app.clone();
    listen(document, "keydown", move |event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let key = Key::from_name(&key.key());
        if key != Key::Other {
            dispatch(&app, PageEvent::KeyDown(key));
        }
    })
}

fn bind_controls(document: &Document, app: &SharedApp) -> anyhow::Result<()> {
    for (selector, control, prevent_default) in CONTROLS {
        for element in select_all(document, selector) {
            let app = app.clone();
            listen(&element, "click", move |event| {
                if prevent_default {
                    event.prevent_default();
                }
                dispatch(&app, PageEvent::Activate(control));
            })?;
        }
    }
    Ok(())
}

/// Enter or Space on a focusable element acts as a click.
fn bind_keyboard_activation(document: &Document) -> anyhow::Result<()> {
    for element in select_all(document, "[tabindex]") {
        let Ok(element) = element.dyn_into::<HtmlElement>() else {
            continue;
        };
        let target = element.clone();
        listen(&element, "keypress", move |event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if activates(&key.key()) {
                event.prevent_default();
                target.click();
            }
        })?;
    }
    Ok(())
}

fn observe_fade_ins(document: &Document) -> anyhow::Result<()> {
    let callback = Closure::<dyn FnMut(js_sys::Array)>::new(|entries: js_sys::Array| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if entry.is_intersecting() {
                if let Err(err) = entry.target().class_list().add_1("animate-in") {
                    log::warn!("fade-in: {}", describe(&err));
                }
            }
        }
    });
    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(0.1));
    options.set_root_margin("0px 0px -50px 0px");
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
            .map_err(js_error)
            .context("create intersection observer")?;
    callback.forget();

    for element in select_all(document, FADE_IN_SELECTOR) {
        observer.observe(&element);
    }
    Ok(())
}

fn bind_diagnostics(window: &web_sys::Window) -> anyhow::Result<()> {
    listen(window, "error", |event| {
        let message = event
            .dyn_ref::<ErrorEvent>()
            .map(|err| err.message())
            .unwrap_or_else(|| event.type_());
        log::error!("uncaught page error: {message}");
    })?;
    listen(window, "online", |_| log::info!("network online"))?;
    listen(window, "offline", |_| log::warn!("network offline"))?;
    Ok(())
}
