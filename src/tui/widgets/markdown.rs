//! Markdown → ratatui Lines renderer for generated protocols.
//!
//! The protocol output leans on bold step titles, bullet lists and the
//! occasional fenced block, so that subset gets styled rendering; anything
//! else falls through as plain text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use syntect::easy::HighlightLines;
use syntect::util::LinesWithEndings;

use crate::core::logging::{get_syntax_set, get_theme_set};
use crate::tui::theme;

/// Render markdown text to styled ratatui lines.
pub fn render_markdown(md: &str) -> Vec<Line<'static>> {
    let mut out = Renderer::default();

    for event in Parser::new(md) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                out.flush();
                out.push_style(heading_style(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                out.pop_style();
                out.flush();
            }

            Event::Start(Tag::Strong) => out.push_modifier(Modifier::BOLD),
            Event::End(TagEnd::Strong) => out.pop_style(),
            Event::Start(Tag::Emphasis) => out.push_modifier(Modifier::ITALIC),
            Event::End(TagEnd::Emphasis) => out.pop_style(),

            Event::Code(code) => out.spans.push(Span::styled(
                format!(" {code} "),
                Style::default().fg(theme::TEXT).bg(theme::BG_SURFACE),
            )),

            Event::Start(Tag::CodeBlock(kind)) => {
                out.flush();
                out.code_lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                out.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                let code = std::mem::take(&mut out.code_buffer);
                if !code.is_empty() {
                    highlight_code(&code, &out.code_lang, &mut out.lines);
                }
                out.in_code_block = false;
            }

            Event::Start(Tag::List(_)) => out.list_depth += 1,
            Event::End(TagEnd::List(_)) => {
                out.list_depth = out.list_depth.saturating_sub(1);
            }
            Event::Start(Tag::Item) => {
                out.flush();
                let indent = "  ".repeat(out.list_depth.saturating_sub(1));
                out.spans.push(Span::styled(
                    format!("{indent}• "),
                    Style::default().fg(theme::PRIMARY_LIGHT),
                ));
            }
            Event::End(TagEnd::Item) => out.flush(),

            Event::End(TagEnd::Paragraph) => {
                out.flush();
                out.lines.push(Line::raw(""));
            }

            Event::Text(text) => {
                if out.in_code_block {
                    out.code_buffer.push_str(&text);
                } else {
                    let style = out.current_style();
                    out.spans.push(Span::styled(text.to_string(), style));
                }
            }

            Event::SoftBreak => out.spans.push(Span::raw(" ")),
            Event::HardBreak => out.flush(),

            Event::Rule => {
                out.flush();
                out.lines.push(Line::styled(
                    "─".repeat(40),
                    Style::default().fg(theme::TEXT_DIM),
                ));
            }

            _ => {}
        }
    }

    out.flush();
    // Drop trailing blank lines
    while out
        .lines
        .last()
        .is_some_and(|l| l.to_string().trim().is_empty())
    {
        out.lines.pop();
    }
    out.lines
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    in_code_block: bool,
    code_lang: String,
    code_buffer: String,
    list_depth: usize,
}

impl Renderer {
    fn current_style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
        HeadingLevel::H2 => Style::default()
            .fg(theme::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD),
        _ => Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
    }
}

/// Highlight a fenced block with syntect; plain text when the language is
/// unknown.
fn highlight_code(code: &str, lang: &str, lines: &mut Vec<Line<'static>>) {
    let ss = get_syntax_set();
    let syntax = ss
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| ss.find_syntax_plain_text());
    let theme_set = get_theme_set();
    let mut highlighter = HighlightLines::new(syntax, &theme_set.themes["base16-ocean.dark"]);

    for line_str in LinesWithEndings::from(code) {
        let rendered = match highlighter.highlight_line(line_str, ss) {
            Ok(ranges) => Line::from(
                ranges
                    .into_iter()
                    .map(|(style, text)| {
                        let fg = style.foreground;
                        Span::styled(
                            text.trim_end_matches('\n').to_string(),
                            Style::default()
                                .fg(Color::Rgb(fg.r, fg.g, fg.b))
                                .bg(theme::BG_CODE),
                        )
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(_) => Line::styled(
                line_str.trim_end_matches('\n').to_string(),
                Style::default().fg(theme::TEXT).bg(theme::BG_CODE),
            ),
        };
        lines.push(rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let lines = render_markdown("Prepare the samples");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].to_string().contains("Prepare the samples"));
    }

    #[test]
    fn test_bold_step_title() {
        let lines = render_markdown("**Step Title (Sample Preparation)**");
        assert!(lines[0]
            .spans
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn test_bullet_list() {
        let lines = render_markdown("- Lab coat\n- Safety glasses");
        assert!(lines.len() >= 2);
        assert!(lines[0].to_string().contains('•'));
    }

    #[test]
    fn test_inline_code_background() {
        let lines = render_markdown("set to `95C` for denaturation");
        assert!(lines[0]
            .spans
            .iter()
            .any(|s| s.style.bg == Some(theme::BG_SURFACE)));
    }

    #[test]
    fn test_code_block_background() {
        let lines = render_markdown("```\nbuffer: 10mM Tris\n```");
        assert!(lines
            .iter()
            .any(|l| l.spans.iter().any(|s| s.style.bg == Some(theme::BG_CODE))));
    }

    #[test]
    fn test_emoji_headers_pass_through() {
        let lines = render_markdown("🔬 PROTOCOL SUMMARY\n\nOverview text");
        let all: String = lines
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(all.contains("🔬 PROTOCOL SUMMARY"));
        assert!(all.contains("Overview text"));
    }

    #[test]
    fn test_empty_input() {
        assert!(render_markdown("").is_empty());
    }
}
