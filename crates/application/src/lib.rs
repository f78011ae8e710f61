//! Application orchestration layer for Folio.

use std::collections::HashMap;

use folio_core::{ChapterList, Direction, Settings, Theme};
use folio_storage::Storage;

mod features;
pub mod navigation;
pub mod page;

pub use page::{ClipboardCallback, Element, Page, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderState {
    pub active: usize,
    pub theme: Theme,
    pub page_views: Option<u64>,
}

/// Owns all mutable reader state. Handlers receive it by `&mut`.
#[derive(Debug)]
pub struct AppContext<P: Page> {
    pub settings: Settings,
    pub chapters: ChapterList,
    pub state: ReaderState,
    pub page: P,
    pub storage: Option<Storage>,
}

impl<P: Page> AppContext<P> {
    pub fn new(settings: Settings, chapters: ChapterList, page: P) -> Self {
        Self {
            settings,
            chapters,
            state: ReaderState::default(),
            page,
            storage: None,
        }
    }

    pub fn with_storage(mut self, storage: Option<Storage>) -> Self {
        if storage.is_none() {
            log::warn!("local storage unavailable, theme memory and view count disabled");
        }
        self.storage = storage;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    ThemeToggle,
    ScrollTop,
    NavToggle,
    NextChapter,
    PreviousChapter,
    Print,
    Cite,
    PdfExport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// Keys that activate a focused element like a click: Enter and Space.
pub fn activates(name: &str) -> bool {
    matches!(name, "Enter" | " " | "Spacebar")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Ready,
    Load,
    Scroll,
    Resize,
    HashChange,
    KeyDown(Key),
    Activate(Control),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Load,
    Scroll,
    Resize,
    HashChange,
    KeyDown,
    Activate(Control),
}

impl PageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PageEvent::Ready => EventKind::Ready,
            PageEvent::Load => EventKind::Load,
            PageEvent::Scroll => EventKind::Scroll,
            PageEvent::Resize => EventKind::Resize,
            PageEvent::HashChange => EventKind::HashChange,
            PageEvent::KeyDown(_) => EventKind::KeyDown,
            PageEvent::Activate(control) => EventKind::Activate(*control),
        }
    }
}

pub type Handler<P> = fn(&mut AppContext<P>, &PageEvent) -> anyhow::Result<()>;

/// Maps event kinds to handlers, run in registration order.
pub struct Dispatcher<P: Page> {
    routes: HashMap<EventKind, Vec<(&'static str, Handler<P>)>>,
}

impl<P: Page> Default for Dispatcher<P> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }
}

impl<P: Page> Dispatcher<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut dispatcher = Self::new();
        dispatcher
            .on(EventKind::Ready, "theme", |ctx, _| ctx.load_theme())
            .on(EventKind::Ready, "statistics", |ctx, _| ctx.update_statistics())
            .on(EventKind::Ready, "dates", |ctx, _| {
                ctx.update_dates();
                Ok(())
            })
            .on(EventKind::Load, "fragment", |ctx, _| {
                ctx.sync_from_fragment();
                Ok(())
            })
            .on(EventKind::Load, "chapter-tracker", detect_chapter)
            .on(EventKind::Resize, "chapter-tracker", detect_chapter)
            .on(EventKind::Scroll, "scroll-top", |ctx, _| {
                ctx.update_scroll_top();
                Ok(())
            })
            .on(EventKind::Scroll, "progress-bar", |ctx, _| {
                ctx.update_progress_bar();
                Ok(())
            })
            .on(EventKind::Scroll, "nav-highlight", |ctx, _| {
                ctx.highlight_nav_link();
                Ok(())
            })
            .on(EventKind::Scroll, "chapter-tracker", detect_chapter)
            .on(EventKind::HashChange, "fragment", |ctx, _| {
                ctx.sync_from_fragment();
                Ok(())
            })
            .on(EventKind::KeyDown, "arrow-keys", |ctx, event| {
                match event {
                    PageEvent::KeyDown(Key::ArrowLeft) => {
                        ctx.navigate(Direction::Previous);
                    }
                    PageEvent::KeyDown(Key::ArrowRight) => {
                        ctx.navigate(Direction::Next);
                    }
                    _ => {}
                }
                Ok(())
            })
            .on(
                EventKind::Activate(Control::NextChapter),
                "next",
                |ctx, _| {
                    ctx.navigate(Direction::Next);
                    Ok(())
                },
            )
            .on(
                EventKind::Activate(Control::PreviousChapter),
                "previous",
                |ctx, _| {
                    ctx.navigate(Direction::Previous);
                    Ok(())
                },
            )
            .on(
                EventKind::Activate(Control::ThemeToggle),
                "theme-toggle",
                |ctx, _| ctx.toggle_theme(),
            )
            .on(EventKind::Activate(Control::ScrollTop), "scroll-top", |ctx, _| {
                ctx.page.scroll_to_top();
                Ok(())
            })
            .on(EventKind::Activate(Control::NavToggle), "nav-toggle", |ctx, _| {
                ctx.toggle_nav_menu();
                Ok(())
            })
            .on(EventKind::Activate(Control::Print), "print", |ctx, _| {
                ctx.page.print();
                Ok(())
            })
            .on(EventKind::Activate(Control::PdfExport), "pdf", |ctx, _| {
                ctx.show_pdf_notice();
                Ok(())
            })
            .on(EventKind::Activate(Control::Cite), "cite", |ctx, _| {
                ctx.copy_citation();
                Ok(())
            });
        dispatcher
    }

    pub fn on(&mut self, kind: EventKind, name: &'static str, handler: Handler<P>) -> &mut Self {
        self.routes.entry(kind).or_default().push((name, handler));
        self
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.routes.get(&kind).map_or(0, Vec::len)
    }

    /// Runs every handler for the event. A failing handler is logged and does not
    /// stop the others. Returns the number of handlers that failed.
    pub fn dispatch(&self, ctx: &mut AppContext<P>, event: &PageEvent) -> usize {
        let Some(handlers) = self.routes.get(&event.kind()) else {
            return 0;
        };
        let mut failed = 0;
        for (name, handler) in handlers {
            if let Err(err) = handler(ctx, event) {
                failed += 1;
                log::error!("{name} handler failed on {event:?}: {err:#}");
            }
        }
        failed
    }
}

fn detect_chapter<P: Page>(ctx: &mut AppContext<P>, _event: &PageEvent) -> anyhow::Result<()> {
    ctx.detect_current_chapter();
    Ok(())
}

/// Reader context plus its routing table.
pub struct App<P: Page> {
    pub ctx: AppContext<P>,
    dispatcher: Dispatcher<P>,
}

impl<P: Page> App<P> {
    pub fn new(ctx: AppContext<P>) -> Self {
        Self::with_dispatcher(ctx, Dispatcher::standard())
    }

    pub fn with_dispatcher(ctx: AppContext<P>, dispatcher: Dispatcher<P>) -> Self {
        Self { ctx, dispatcher }
    }

    pub fn handle(&mut self, event: PageEvent) -> usize {
        self.dispatcher.dispatch(&mut self.ctx, &event)
    }

    pub fn active_chapter(&self) -> usize {
        self.ctx.state.active
    }
}
