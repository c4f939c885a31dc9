//! Terminal output for the CLI.
//!
//! Colors are used only when stdout is a terminal and `NO_COLOR` is unset.

use crate::schema::{Chapter, Manga, Tag, TypedResource, User};
use std::io::{self, IsTerminal};

/// ANSI style codes.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    Gray,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Placeholder for a missing attribute.
const NONE: &str = "-";

#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();
        Self { colors_enabled }
    }

    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    fn label(&self, label: &str, color: Style) -> String {
        format!("[{}]", self.style(label, &[color, Style::Bold]))
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.label("ERROR", Style::Red), message);
    }

    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Cyan, Style::Bold]));
    }

    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    /// One line per manga: title, year, status and id.
    pub fn manga_line(&self, manga: &Manga) -> String {
        let title = manga.title.preferred().unwrap_or(NONE);
        let year = manga.year.map_or_else(|| NONE.to_string(), |y| y.to_string());
        let status = manga.status.map_or_else(|| NONE.to_string(), |s| s.to_string());
        format!(
            "{} ({year}, {status}) {}",
            self.style(title, &[Style::Bold]),
            self.muted(manga.id())
        )
    }

    /// Full details for a single manga.
    pub fn manga_details(&self, manga: &Manga) -> String {
        let mut lines = vec![self.manga_line(manga)];
        if let Some(description) = manga.description.preferred() {
            lines.push(description.trim().to_string());
        }
        let tags = manga.tag_names();
        if !tags.is_empty() {
            lines.push(format!("{} {}", self.muted("tags:"), tags.join(", ")));
        }
        if let Some(rating) = manga.content_rating {
            lines.push(format!("{} {rating}", self.muted("rating:")));
        }
        if let Some(lang) = &manga.original_language {
            lines.push(format!("{} {lang}", self.muted("language:")));
        }
        lines.join("\n")
    }

    /// `Vol. 2 Ch. 14 [en] Title  <id>`
    pub fn chapter_line(&self, chapter: &Chapter) -> String {
        let mut parts = Vec::new();
        if let Some(volume) = &chapter.volume {
            parts.push(format!("Vol. {volume}"));
        }
        parts.push(format!("Ch. {}", chapter.chapter.as_deref().unwrap_or(NONE)));
        if let Some(lang) = &chapter.translated_language {
            parts.push(format!("[{lang}]"));
        }
        if let Some(title) = chapter.title.as_deref().filter(|t| !t.is_empty()) {
            parts.push(title.to_string());
        }
        format!("{}  {}", parts.join(" "), self.muted(chapter.id()))
    }

    pub fn tag_line(&self, tag: &Tag) -> String {
        let group = tag.group.as_deref().unwrap_or(NONE);
        format!(
            "{} {}",
            self.style(tag.name.preferred().unwrap_or(NONE), &[Style::Bold]),
            self.muted(&format!("({group}) {}", tag.id()))
        )
    }

    pub fn user_line(&self, user: &User) -> String {
        let roles = if user.roles.is_empty() {
            String::new()
        } else {
            format!(" [{}]", user.roles.join(", "))
        };
        format!(
            "{}{roles} {}",
            self.style(&user.username, &[Style::Bold]),
            self.muted(user.id())
        )
    }

    /// `shown 10 of 25`
    pub fn count_summary(&self, shown: usize, total: Option<usize>) -> String {
        match total {
            Some(total) => format!("shown {shown} of {total}"),
            None => format!("shown {shown}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::decode_as;
    use serde_json::json;

    #[test]
    fn test_style_disabled() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("hello", &[Style::Red]), "hello");
    }

    #[test]
    fn test_style_enabled() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Bold, Style::Red]);
        assert!(styled.starts_with("\x1b[1;31m"));
        assert!(styled.ends_with(RESET));
    }

    #[test]
    fn test_manga_line() {
        let console = Console::with_colors(false);
        let manga = decode_as::<Manga>(&json!({
            "id": "m-1",
            "type": "manga",
            "attributes": {"title": {"ja": "Sousou", "en": "Frieren"}, "year": 2020, "status": "ongoing"}
        }))
        .unwrap();
        assert_eq!(console.manga_line(&manga), "Frieren (2020, ongoing) m-1");
    }

    #[test]
    fn test_chapter_line_skips_missing_parts() {
        let console = Console::with_colors(false);
        let chapter = decode_as::<Chapter>(&json!({
            "id": "c-1",
            "type": "chapter",
            "attributes": {"chapter": "3", "translatedLanguage": "en", "title": ""}
        }))
        .unwrap();
        assert_eq!(console.chapter_line(&chapter), "Ch. 3 [en]  c-1");
    }

    #[test]
    fn test_count_summary() {
        let console = Console::with_colors(false);
        assert_eq!(console.count_summary(10, Some(25)), "shown 10 of 25");
        assert_eq!(console.count_summary(3, None), "shown 3");
    }
}
