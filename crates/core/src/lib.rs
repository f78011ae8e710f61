//! Core domain types for Folio.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAPTERS: [&str; 7] = [
    "capitulo1",
    "capitulo2",
    "capitulo3",
    "capitulo4",
    "capitulo5",
    "paradigma-centripeto",
    "estructura-basica",
];

/// Ordered chapter identifiers. Never empty, never contains duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterList {
    ids: Vec<String>,
}

impl ChapterList {
    pub fn new<I, S>(ids: I) -> Result<Self, &'static str>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err("chapter list is empty");
        }
        for (idx, id) in ids.iter().enumerate() {
            if ids[..idx].contains(id) {
                return Err("duplicate chapter id");
            }
        }
        Ok(Self { ids })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|c| c == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl Default for ChapterList {
    fn default() -> Self {
        Self {
            ids: DEFAULT_CHAPTERS.iter().map(|id| id.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// Steps one position from `current` with wraparound at both ends.
    pub fn step(self, current: usize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let current = current % len;
        match self {
            Direction::Next => (current + 1) % len,
            Direction::Previous => (current + len - 1) % len,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Accessible label for the toggle, describing what a click will do.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Dark => "Cambiar a modo claro",
            Theme::Light => "Cambiar a modo oscuro",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err("unknown theme"),
        }
    }
}

/// Vertical span of an element relative to the top of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    /// Overlap with the `[0, viewport_height]` band. Negative when the element is off screen.
    pub fn visible_extent(&self, viewport_height: f64) -> f64 {
        self.bottom.min(viewport_height) - self.top.max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chapters: Vec<String>,
    pub words_per_minute: u32,
    pub scroll_top_threshold: f64,
    pub section_offset: f64,
    pub citation_title: String,
    pub locale: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chapters: DEFAULT_CHAPTERS.iter().map(|id| id.to_string()).collect(),
            words_per_minute: 200,
            scroll_top_threshold: 300.0,
            section_offset: 100.0,
            citation_title: "Arquitectura de Computadores: Evolución y Paradigmas Emergentes"
                .to_string(),
            locale: "es-ES".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.chapters = self
            .chapters
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        self.words_per_minute = self.words_per_minute.max(1);
        if !self.scroll_top_threshold.is_finite() || self.scroll_top_threshold < 0.0 {
            self.scroll_top_threshold = 0.0;
        }
        if !self.section_offset.is_finite() || self.section_offset < 0.0 {
            self.section_offset = 0.0;
        }
        if self.locale.trim().is_empty() {
            self.locale = "es-ES".to_string();
        }
    }

    pub fn chapter_list(&self) -> Result<ChapterList, &'static str> {
        ChapterList::new(self.chapters.iter().cloned())
    }
}

/// "Capítulo {i+1} de {N}" for a zero-based active index.
pub fn chapter_indicator(index: usize, total: usize) -> String {
    format!("Capítulo {} de {}", index + 1, total)
}

/// Scrolled fraction of the document as a percentage in `[0, 100]`.
pub fn scroll_percent(scroll_y: f64, document_height: f64, viewport_height: f64) -> f64 {
    let scrollable = document_height - viewport_height;
    if scrollable <= 0.0 || !scrollable.is_finite() {
        return 0.0;
    }
    (scroll_y / scrollable * 100.0).clamp(0.0, 100.0)
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Groups thousands with `.` the way es-ES does: four-digit numbers stay ungrouped.
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    if digits.len() < 5 {
        return digits;
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

pub fn read_time_minutes(words: usize, words_per_minute: u32) -> usize {
    let wpm = words_per_minute.max(1) as usize;
    words.div_ceil(wpm)
}

pub fn citation(title: &str, date: &str, url: &str) -> String {
    format!("{title}. ({date}). Recuperado de {url}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub long_date: String,
    pub short_date: String,
    pub year: i32,
}
