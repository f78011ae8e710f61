use std::rc::Rc;

use folio_application::{
    App, AppContext, Control, Dispatcher, Element, EventKind, Key, Page, PageEvent,
};
use folio_core::{ChapterList, Settings, Theme};
use folio_storage::{Backend, MemoryBackend, PAGE_VIEWS_KEY, Storage, THEME_KEY};

use crate::{ClipboardMode, FakeElement, FakePage, book_page, make_app, make_settings};

/// Moves every default chapter as if the window had scrolled to `y`.
fn scroll_book(page: &FakePage, y: f64) {
    for (idx, id) in ChapterList::default().iter().enumerate() {
        let top = idx as f64 * 1000.0 - y;
        if let Some(el) = page.get(id) {
            el.set_bounds(top, top + 1000.0);
        }
    }
}

struct BrokenBackend;

impl Backend for BrokenBackend {
    fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("SecurityError: storage disabled")
    }

    fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("SecurityError: storage disabled")
    }
}

#[test]
fn load_publishes_most_visible_chapter() {
    let page = book_page();
    scroll_book(&page, 1800.0);
    let mut app = make_app(page.clone(), None);

    assert_eq!(app.handle(PageEvent::Load), 0);
    assert_eq!(app.active_chapter(), 2);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 3 de 7"));
}

#[test]
fn load_seeds_active_chapter_from_fragment() {
    let page = book_page();
    scroll_book(&page, -5000.0);
    page.set_fragment(Some("capitulo5"));
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Ready);
    assert_eq!(app.handle(PageEvent::Load), 0);
    assert_eq!(app.active_chapter(), 4);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 5 de 7"));
}

#[test]
fn load_with_unknown_fragment_starts_at_first_chapter() {
    let page = book_page();
    scroll_book(&page, -5000.0);
    page.set_fragment(Some("bibliografia"));
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Load);
    assert_eq!(app.active_chapter(), 0);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 1 de 7"));
}

#[test]
fn visible_chapter_overrides_fragment_on_load() {
    let page = book_page();
    scroll_book(&page, 1800.0);
    page.set_fragment(Some("capitulo5"));
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Load);
    assert_eq!(app.active_chapter(), 2);
}

#[test]
fn scroll_and_resize_recompute_active_chapter() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);

    scroll_book(&page, 5900.0);
    app.handle(PageEvent::Scroll);
    assert_eq!(app.active_chapter(), 6);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 7 de 7"));

    scroll_book(&page, 3300.0);
    app.handle(PageEvent::Resize);
    assert_eq!(app.active_chapter(), 3);
}

#[test]
fn nothing_visible_keeps_previous_chapter() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);
    scroll_book(&page, 4000.0);
    app.handle(PageEvent::Scroll);
    assert_eq!(app.active_chapter(), 4);

    // Past the end of the book: no chapter overlaps the viewport.
    scroll_book(&page, 9000.0);
    app.handle(PageEvent::Scroll);
    assert_eq!(app.active_chapter(), 4);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 5 de 7"));
}

#[test]
fn equal_extents_report_the_earlier_chapter() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);
    page.get("capitulo2").unwrap().set_bounds(-600.0, 400.0);
    page.get("capitulo3").unwrap().set_bounds(400.0, 1400.0);
    page.get("capitulo1").unwrap().set_bounds(-1600.0, -600.0);

    app.handle(PageEvent::Scroll);
    assert_eq!(app.active_chapter(), 1);
}

#[test]
fn tracker_skips_missing_chapters() {
    let page = book_page();
    scroll_book(&page, 2300.0);
    page.remove("capitulo3");
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Load);
    assert_eq!(app.active_chapter(), 3);
}

#[test]
fn next_wraps_from_last_chapter() {
    let page = book_page();
    page.set_fragment(Some("estructura-basica"));
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Activate(Control::NextChapter));
    assert_eq!(app.active_chapter(), 0);
    assert_eq!(page.pushed_fragments(), vec!["capitulo1".to_string()]);
    assert_eq!(page.get("capitulo1").unwrap().scrolled_into_view(), 1);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 1 de 7"));
}

#[test]
fn previous_without_fragment_wraps_to_last_chapter() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Activate(Control::PreviousChapter));
    assert_eq!(app.active_chapter(), 6);
    assert_eq!(page.fragment().as_deref(), Some("estructura-basica"));
}

#[test]
fn unknown_fragment_counts_as_first_chapter() {
    let page = book_page();
    page.set_fragment(Some("apendice"));
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Activate(Control::NextChapter));
    assert_eq!(app.active_chapter(), 1);
    assert_eq!(page.fragment().as_deref(), Some("capitulo2"));
}

#[test]
fn navigation_follows_the_fragment_not_the_scroll_position() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);
    scroll_book(&page, 4000.0);
    app.handle(PageEvent::Scroll);
    assert_eq!(app.active_chapter(), 4);

    page.set_fragment(Some("capitulo2"));
    app.handle(PageEvent::Activate(Control::NextChapter));
    assert_eq!(app.active_chapter(), 2);
}

#[test]
fn missing_target_leaves_state_untouched() {
    let page = book_page();
    page.set_fragment(Some("capitulo2"));
    let mut app = make_app(page.clone(), None);
    app.handle(PageEvent::HashChange);
    assert_eq!(app.active_chapter(), 1);
    page.remove("capitulo3");

    assert_eq!(app.handle(PageEvent::Activate(Control::NextChapter)), 0);
    assert_eq!(app.active_chapter(), 1);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 2 de 7"));
    assert!(page.pushed_fragments().is_empty());
    assert_eq!(page.fragment().as_deref(), Some("capitulo2"));
}

#[test]
fn arrow_keys_navigate() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::KeyDown(Key::ArrowRight));
    assert_eq!(app.active_chapter(), 1);
    app.handle(PageEvent::KeyDown(Key::ArrowRight));
    assert_eq!(app.active_chapter(), 2);
    app.handle(PageEvent::KeyDown(Key::ArrowLeft));
    assert_eq!(app.active_chapter(), 1);
    app.handle(PageEvent::KeyDown(Key::Other));
    assert_eq!(app.active_chapter(), 1);
}

#[test]
fn hash_change_only_accepts_known_chapters() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);

    page.set_fragment(Some("capitulo5"));
    app.handle(PageEvent::HashChange);
    assert_eq!(app.active_chapter(), 4);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 5 de 7"));

    page.set_fragment(Some("bibliografia"));
    app.handle(PageEvent::HashChange);
    assert_eq!(app.active_chapter(), 4);

    page.set_fragment(None);
    app.handle(PageEvent::HashChange);
    assert_eq!(app.active_chapter(), 4);
}

#[test]
fn missing_indicator_element_is_skipped() {
    let page = book_page();
    page.remove("chapter-info");
    let mut app = make_app(page.clone(), None);

    assert_eq!(app.handle(PageEvent::Activate(Control::NextChapter)), 0);
    assert_eq!(app.active_chapter(), 1);
}

#[test]
fn theme_defaults_to_system_preference_and_toggles_back() -> anyhow::Result<()> {
    let page = book_page();
    page.add(FakeElement::with_id("theme-toggle"));
    page.set_prefers_dark(true);
    let backend = Rc::new(MemoryBackend::new());
    let mut app = make_app(page.clone(), Some(Storage::new(backend.clone())));

    app.handle(PageEvent::Ready);
    assert_eq!(app.ctx.state.theme, Theme::Dark);
    assert_eq!(page.html().attribute("data-theme").as_deref(), Some("dark"));
    assert_eq!(
        page.get("theme-toggle").unwrap().attribute("aria-label").as_deref(),
        Some("Cambiar a modo claro")
    );

    app.handle(PageEvent::Activate(Control::ThemeToggle));
    assert_eq!(page.html().attribute("data-theme").as_deref(), Some("light"));
    assert_eq!(backend.get(THEME_KEY)?.as_deref(), Some("light"));

    app.handle(PageEvent::Activate(Control::ThemeToggle));
    assert_eq!(app.ctx.state.theme, Theme::Dark);
    assert_eq!(page.html().attribute("data-theme").as_deref(), Some("dark"));
    assert_eq!(backend.get(THEME_KEY)?.as_deref(), Some("dark"));
    assert_eq!(page.transitions(), 2);
    Ok(())
}

#[test]
fn stored_theme_wins_over_system_preference() -> anyhow::Result<()> {
    let page = book_page();
    page.set_prefers_dark(true);
    let backend = Rc::new(MemoryBackend::new());
    backend.set(THEME_KEY, "light")?;
    let mut app = make_app(page.clone(), Some(Storage::new(backend)));

    app.handle(PageEvent::Ready);
    assert_eq!(app.ctx.state.theme, Theme::Light);
    assert_eq!(page.html().attribute("data-theme").as_deref(), Some("light"));
    Ok(())
}

#[test]
fn theme_toggle_works_without_storage() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);
    app.handle(PageEvent::Ready);
    assert_eq!(app.ctx.state.theme, Theme::Light);

    assert_eq!(app.handle(PageEvent::Activate(Control::ThemeToggle)), 0);
    assert_eq!(page.html().attribute("data-theme").as_deref(), Some("dark"));
}

#[test]
fn ready_fills_statistics_and_dates() -> anyhow::Result<()> {
    let page = book_page();
    let words = vec!["palabra"; 12_345].join(" ");
    page.add(FakeElement::new().matching("main").with_text(&words));
    for id in ["word-count", "read-time", "view-count", "current-date", "current-year", "footer-year"] {
        page.add(FakeElement::with_id(id));
    }
    let backend = Rc::new(MemoryBackend::new());
    backend.set(PAGE_VIEWS_KEY, "41")?;
    let mut app = make_app(page.clone(), Some(Storage::new(backend.clone())));

    assert_eq!(app.handle(PageEvent::Ready), 0);
    assert_eq!(page.text_of("word-count").as_deref(), Some("12.345 palabras"));
    assert_eq!(page.text_of("read-time").as_deref(), Some("62 min"));
    assert_eq!(page.text_of("view-count").as_deref(), Some("Visitas: 42"));
    assert_eq!(backend.get(PAGE_VIEWS_KEY)?.as_deref(), Some("42"));
    assert_eq!(
        page.text_of("current-date").as_deref(),
        Some("sábado, 17 de octubre de 2026")
    );
    assert_eq!(page.text_of("current-year").as_deref(), Some("2026"));
    assert_eq!(page.text_of("footer-year").as_deref(), Some("2026"));
    Ok(())
}

#[test]
fn statistics_skip_missing_elements_and_storage() {
    let page = book_page();
    page.add(FakeElement::with_id("view-count"));
    let mut app = make_app(page.clone(), None);

    assert_eq!(app.handle(PageEvent::Ready), 0);
    assert_eq!(page.text_of("view-count").as_deref(), Some(""));
    assert_eq!(app.ctx.state.page_views, None);
}

#[test]
fn broken_storage_only_fails_its_own_feature() {
    let page = book_page();
    page.set_prefers_dark(true);
    page.add(FakeElement::with_id("current-year"));
    let mut app = make_app(page.clone(), Some(Storage::new(BrokenBackend)));

    // The view counter fails; theme and dates still run.
    assert_eq!(app.handle(PageEvent::Ready), 1);
    assert_eq!(page.html().attribute("data-theme").as_deref(), Some("dark"));
    assert_eq!(page.text_of("current-year").as_deref(), Some("2026"));

    assert_eq!(app.handle(PageEvent::Activate(Control::ThemeToggle)), 1);
    assert_eq!(page.html().attribute("data-theme").as_deref(), Some("light"));
}

#[test]
fn scroll_updates_scroll_top_and_progress_bar() {
    let page = book_page();
    let button = page.add(FakeElement::with_id("scroll-top"));
    let bar = page.add(FakeElement::with_id("progress-bar"));
    let mut app = make_app(page.clone(), None);

    page.set_viewport(800.0, 2100.0, 5000.0);
    app.handle(PageEvent::Scroll);
    assert!(button.has_class("visible"));
    assert_eq!(bar.style("width"), "50%");

    page.set_viewport(800.0, 300.0, 5000.0);
    app.handle(PageEvent::Scroll);
    assert!(!button.has_class("visible"));

    app.handle(PageEvent::Activate(Control::ScrollTop));
    assert_eq!(page.scrolls_to_top(), 1);
}

#[test]
fn nav_toggle_flips_menu_visibility() {
    let page = book_page();
    let toggle = page.add(FakeElement::with_id("nav-toggle"));
    let links = page.add(FakeElement::with_id("nav-links"));
    let mut app = make_app(page.clone(), None);

    // Without an inline style the menu counts as shown, so the first click hides it.
    app.handle(PageEvent::Activate(Control::NavToggle));
    assert_eq!(links.style("display"), "none");
    assert!(toggle.inner_html().contains("fa-bars"));

    app.handle(PageEvent::Activate(Control::NavToggle));
    assert_eq!(links.style("display"), "block");
    assert!(toggle.inner_html().contains("fa-times"));
}

#[test]
fn nav_toggle_needs_both_elements() {
    let page = book_page();
    let toggle = page.add(FakeElement::with_id("nav-toggle"));
    let mut app = make_app(page.clone(), None);

    assert_eq!(app.handle(PageEvent::Activate(Control::NavToggle)), 0);
    assert_eq!(toggle.inner_html(), "");
}

#[test]
fn scroll_highlights_the_current_section_link() {
    let page = book_page();
    page.add(
        FakeElement::with_id("intro")
            .matching("section[id]")
            .laid_out(0.0, 600.0),
    );
    page.add(
        FakeElement::with_id("capitulo1-section")
            .matching("section[id]")
            .laid_out(600.0, 2000.0),
    );
    let intro_link = page.add(FakeElement::new().matching(".nav-link"));
    intro_link.set_attribute("href", "#intro");
    let chapter_link = page.add(FakeElement::new().matching(".nav-link"));
    chapter_link.set_attribute("href", "#capitulo1-section");
    let mut app = make_app(page.clone(), None);

    page.set_viewport(800.0, 100.0, 5000.0);
    app.handle(PageEvent::Scroll);
    assert!(intro_link.has_class("active"));
    assert!(!chapter_link.has_class("active"));

    page.set_viewport(800.0, 700.0, 5000.0);
    app.handle(PageEvent::Scroll);
    assert!(!intro_link.has_class("active"));
    assert!(chapter_link.has_class("active"));

    page.set_viewport(800.0, 4000.0, 5000.0);
    app.handle(PageEvent::Scroll);
    assert!(!intro_link.has_class("active"));
    assert!(!chapter_link.has_class("active"));
}

#[test]
fn citation_is_copied_and_confirmed() {
    let page = book_page();
    page.set_fragment(Some("capitulo2"));
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Activate(Control::Cite));
    let expected = "Arquitectura de Computadores: Evolución y Paradigmas Emergentes. (17/10/2026). Recuperado de https://libro.example/#capitulo2";
    assert_eq!(page.clipboard().as_deref(), Some(expected));
    assert_eq!(
        page.alerts(),
        vec![format!("Cita copiada al portapapeles:\n\n{expected}")]
    );
    assert!(page.prompts().is_empty());
}

#[test]
fn citation_falls_back_to_manual_copy() {
    let page = book_page();
    page.set_clipboard_mode(ClipboardMode::Reject("NotAllowedError".to_string()));
    let mut app = make_app(page.clone(), None);

    assert_eq!(app.handle(PageEvent::Activate(Control::Cite)), 0);
    assert!(page.clipboard().is_none());
    assert!(page.alerts().is_empty());
    let prompts = page.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].0, "Copia manualmente esta cita:");
    assert!(prompts[0].1.contains("Recuperado de https://libro.example/"));
}

#[test]
fn print_and_pdf_controls() {
    let page = book_page();
    let mut app = make_app(page.clone(), None);

    app.handle(PageEvent::Activate(Control::Print));
    app.handle(PageEvent::Activate(Control::PdfExport));
    assert_eq!(page.prints(), 1);
    assert_eq!(page.alerts().len(), 1);
    assert!(page.alerts()[0].contains("impresión"));
}

#[test]
fn empty_page_tolerates_every_event() {
    let page = FakePage::new();
    let mut app = make_app(page.clone(), None);
    let events = [
        PageEvent::Ready,
        PageEvent::Load,
        PageEvent::Scroll,
        PageEvent::Resize,
        PageEvent::HashChange,
        PageEvent::KeyDown(Key::ArrowRight),
        PageEvent::Activate(Control::NextChapter),
        PageEvent::Activate(Control::PreviousChapter),
        PageEvent::Activate(Control::NavToggle),
        PageEvent::Activate(Control::ThemeToggle),
    ];
    for event in events {
        assert_eq!(app.handle(event), 0, "{event:?}");
    }
    assert_eq!(app.active_chapter(), 0);
    assert!(page.pushed_fragments().is_empty());
}

#[test]
fn failing_handler_does_not_stop_the_rest() {
    let page = book_page();
    let ctx = AppContext::new(Settings::default(), ChapterList::default(), page);
    let mut dispatcher = Dispatcher::<FakePage>::new();
    dispatcher
        .on(EventKind::Scroll, "broken", |_, _| anyhow::bail!("boom"))
        .on(EventKind::Scroll, "marker", |ctx, _| {
            ctx.state.active = 3;
            Ok(())
        });
    let mut app = App::with_dispatcher(ctx, dispatcher);

    assert_eq!(app.handle(PageEvent::Scroll), 1);
    assert_eq!(app.active_chapter(), 3);
    assert_eq!(app.handle(PageEvent::Load), 0);
}

#[test]
fn standard_routes_cover_every_event() {
    let dispatcher = Dispatcher::<FakePage>::standard();
    assert_eq!(dispatcher.handler_count(EventKind::Ready), 3);
    assert_eq!(dispatcher.handler_count(EventKind::Scroll), 4);
    assert_eq!(dispatcher.handler_count(EventKind::Load), 2);
    for kind in [EventKind::Resize, EventKind::HashChange, EventKind::KeyDown] {
        assert_eq!(dispatcher.handler_count(kind), 1, "{kind:?}");
    }
    for control in [
        Control::ThemeToggle,
        Control::ScrollTop,
        Control::NavToggle,
        Control::NextChapter,
        Control::PreviousChapter,
        Control::Print,
        Control::Cite,
        Control::PdfExport,
    ] {
        assert_eq!(dispatcher.handler_count(EventKind::Activate(control)), 1);
    }
}

#[test]
fn custom_chapter_list_drives_the_indicator() {
    let page = FakePage::new();
    page.add(FakeElement::with_id("chapter-info"));
    page.add(FakeElement::with_id("uno").at(0.0, 900.0));
    page.add(FakeElement::with_id("dos").at(900.0, 1800.0));
    let settings = make_settings(&["uno", "dos"]);
    let chapters = settings.chapter_list().unwrap();
    let mut app = App::new(AppContext::new(settings, chapters, page.clone()));

    app.handle(PageEvent::KeyDown(Key::ArrowLeft));
    assert_eq!(app.active_chapter(), 1);
    assert_eq!(page.text_of("chapter-info").as_deref(), Some("Capítulo 2 de 2"));
}
