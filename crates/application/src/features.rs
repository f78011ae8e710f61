//! Theme, scroll feedback, reading statistics and the small interactive affordances.

use folio_core::{Theme, citation, count_words, format_count, read_time_minutes, scroll_percent};

use crate::AppContext;
use crate::page::{Element, Page};

const PDF_NOTICE: &str = "Función de exportación a PDF en desarrollo. Por ahora, puedes usar la función de impresión de tu navegador.";

impl<P: Page> AppContext<P> {
    /// Stored theme if any, otherwise the system preference.
    pub fn load_theme(&mut self) -> anyhow::Result<()> {
        let saved = match &self.storage {
            Some(storage) => storage.load_theme().unwrap_or_else(|err| {
                log::warn!("stored theme unreadable, using system preference: {err:#}");
                None
            }),
            None => None,
        };
        let theme = saved.unwrap_or_else(|| {
            if self.page.prefers_dark() {
                Theme::Dark
            } else {
                Theme::Light
            }
        });
        self.apply_theme(theme);
        Ok(())
    }

    pub fn apply_theme(&mut self, theme: Theme) {
        self.state.theme = theme;
        if let Some(root) = self.page.root() {
            root.set_attribute("data-theme", theme.as_str());
        }
        if let Some(toggle) = self.page.element_by_id("theme-toggle") {
            toggle.set_attribute("aria-label", theme.toggle_label());
        }
    }

    pub fn toggle_theme(&mut self) -> anyhow::Result<()> {
        let theme = self.state.theme.toggled();
        self.apply_theme(theme);
        self.page.theme_transition();
        if let Some(storage) = &self.storage {
            storage.save_theme(theme)?;
        }
        Ok(())
    }

    pub fn update_scroll_top(&self) {
        let Some(button) = self.page.element_by_id("scroll-top") else {
            return;
        };
        let visible = self.page.viewport().scroll_y > self.settings.scroll_top_threshold;
        button.set_class("visible", visible);
    }

    pub fn update_progress_bar(&self) {
        let Some(bar) = self.page.element_by_id("progress-bar") else {
            return;
        };
        let viewport = self.page.viewport();
        let percent = scroll_percent(viewport.scroll_y, viewport.document_height, viewport.height);
        bar.set_style("width", &format!("{percent}%"));
    }

    pub fn toggle_nav_menu(&self) {
        let (Some(toggle), Some(links)) = (
            self.page.element_by_id("nav-toggle"),
            self.page.element_by_id("nav-links"),
        ) else {
            return;
        };
        let hidden = links.style("display") != "none";
        links.set_style("display", if hidden { "none" } else { "block" });
        toggle.set_inner_html(if hidden {
            r#"<i class="fas fa-bars"></i>"#
        } else {
            r#"<i class="fas fa-times"></i>"#
        });
    }

    pub fn update_statistics(&mut self) -> anyhow::Result<()> {
        if let Some(main) = self.page.query_first("main") {
            let words = count_words(&main.text());
            if let Some(el) = self.page.element_by_id("word-count") {
                el.set_text(&format!("{} palabras", format_count(words)));
            }
            if let Some(el) = self.page.element_by_id("read-time") {
                let minutes = read_time_minutes(words, self.settings.words_per_minute);
                el.set_text(&format!("{minutes} min"));
            }
        }

        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let views = storage.record_page_view()?;
        self.state.page_views = Some(views);
        if let Some(el) = self.page.element_by_id("view-count") {
            el.set_text(&format!("Visitas: {views}"));
        }
        Ok(())
    }

    pub fn update_dates(&self) {
        let calendar = self.page.calendar();
        if let Some(el) = self.page.element_by_id("current-date") {
            el.set_text(&calendar.long_date);
        }
        for id in ["current-year", "footer-year"] {
            if let Some(el) = self.page.element_by_id(id) {
                el.set_text(&calendar.year.to_string());
            }
        }
    }

    pub fn show_pdf_notice(&self) {
        self.page.alert(PDF_NOTICE);
    }

    /// Copies an APA-style citation; on clipboard failure the text is offered for manual copy.
    pub fn copy_citation(&self) -> String {
        let date = self.page.calendar().short_date;
        let text = citation(&self.settings.citation_title, &date, &self.page.href());
        let page = self.page.clone();
        let copied = text.clone();
        self.page.write_clipboard(
            &text,
            Box::new(move |result| match result {
                Ok(()) => page.alert(&format!("Cita copiada al portapapeles:\n\n{copied}")),
                Err(err) => {
                    log::error!("clipboard write failed: {err}");
                    page.prompt("Copia manualmente esta cita:", &copied);
                }
            }),
        );
        text
    }
}
