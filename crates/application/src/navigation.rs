//! Chapter position tracking, chapter-to-chapter navigation and the indicator.

use folio_core::{Bounds, ChapterList, Direction, chapter_indicator};

use crate::AppContext;
use crate::page::{Element, Page};

pub const CHAPTER_INFO_ID: &str = "chapter-info";

/// Index of the chapter with the largest strictly positive visible extent.
///
/// Chapters without an element (`None`) are skipped. Ties keep the lowest index.
/// Returns `None` when nothing is visible.
pub fn most_visible<I>(chapters: I, viewport_height: f64) -> Option<usize>
where
    I: IntoIterator<Item = Option<Bounds>>,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, bounds) in chapters.into_iter().enumerate() {
        let Some(bounds) = bounds else {
            continue;
        };
        let visible = bounds.visible_extent(viewport_height);
        if visible <= 0.0 {
            continue;
        }
        if best.is_none_or(|(_, max)| visible > max) {
            best = Some((idx, visible));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Chapter named by the fragment, or the first chapter when it names nothing known.
pub fn index_from_fragment(chapters: &ChapterList, fragment: Option<&str>) -> usize {
    fragment
        .and_then(|id| chapters.position(id))
        .unwrap_or(0)
}

/// `id` of the last section whose offset window contains `scroll_y`.
pub fn active_section<'a, I>(sections: I, scroll_y: f64, offset: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, f64, f64)>,
{
    let mut current = None;
    for (id, offset_top, height) in sections {
        let top = offset_top - offset;
        if scroll_y >= top && scroll_y < top + height {
            current = Some(id);
        }
    }
    current
}

impl<P: Page> AppContext<P> {
    /// Recomputes the active chapter from element geometry and republishes it.
    pub fn detect_current_chapter(&mut self) {
        let viewport = self.page.viewport();
        let bounds = self
            .chapters
            .iter()
            .map(|id| self.page.element_by_id(id).map(|el| el.bounds()));
        if let Some(idx) = most_visible(bounds, viewport.height) {
            self.state.active = idx;
        }
        self.publish_indicator();
    }

    /// Moves one chapter in `direction`, starting from the chapter named in the
    /// location fragment. Nothing changes when the target element is missing.
    pub fn navigate(&mut self, direction: Direction) -> bool {
        let fragment = self.page.fragment();
        let current = index_from_fragment(&self.chapters, fragment.as_deref());
        let target = direction.step(current, self.chapters.len());
        let Some(id) = self.chapters.get(target) else {
            return false;
        };
        let Some(element) = self.page.element_by_id(id) else {
            log::debug!("chapter element #{id} not found, navigation skipped");
            return false;
        };

        element.scroll_into_view();
        self.page.push_fragment(id);
        self.state.active = target;
        self.publish_indicator();
        true
    }

    /// Takes the active chapter from the fragment if it names a known chapter.
    pub fn sync_from_fragment(&mut self) -> bool {
        let Some(fragment) = self.page.fragment() else {
            return false;
        };
        let Some(idx) = self.chapters.position(&fragment) else {
            return false;
        };
        self.state.active = idx;
        self.publish_indicator();
        true
    }

    pub fn publish_indicator(&self) {
        if let Some(info) = self.page.element_by_id(CHAPTER_INFO_ID) {
            info.set_text(&chapter_indicator(self.state.active, self.chapters.len()));
        }
    }

    pub fn highlight_nav_link(&self) {
        let scroll_y = self.page.viewport().scroll_y;
        let sections: Vec<(String, f64, f64)> = self
            .page
            .query_all("section[id]")
            .iter()
            .filter_map(|section| {
                let id = section.attribute("id")?;
                Some((id, section.offset_top(), section.height()))
            })
            .collect();
        let current = active_section(
            sections
                .iter()
                .map(|(id, top, height)| (id.as_str(), *top, *height)),
            scroll_y,
            self.settings.section_offset,
        );
        let wanted = current.map(|id| format!("#{id}"));

        for link in self.page.query_all(".nav-link") {
            let is_active = wanted.is_some() && link.attribute("href") == wanted;
            link.set_class("active", is_active);
        }
    }
}
