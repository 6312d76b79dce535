//! Centralized Green & Amber color theme for the Synapse TUI.
//!
//! All color constants are RGB truecolor. Views import from here instead of
//! using inline `Color::*` literals.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

// ── Primary palette ─────────────────────────────────────────────────────────

/// Lab green — primary accent, focused borders, assistant turns.
pub const PRIMARY: Color = Color::Rgb(0x2E, 0x7D, 0x32);
/// Light green — highlights, hints.
pub const PRIMARY_LIGHT: Color = Color::Rgb(0x66, 0xBB, 0x6A);

// ── Accent ──────────────────────────────────────────────────────────────────

/// Amber — calls to action, the brand badge, user turns.
pub const ACCENT: Color = Color::Rgb(0xFF, 0xB3, 0x00);

// ── Backgrounds ─────────────────────────────────────────────────────────────

/// Surface — elevated panels, inline-code background.
pub const BG_SURFACE: Color = Color::Rgb(0x1B, 0x26, 0x1B);
/// Code block background.
pub const BG_CODE: Color = Color::Rgb(0x20, 0x26, 0x28);

// ── Text ────────────────────────────────────────────────────────────────────

/// Primary text.
pub const TEXT: Color = Color::Rgb(0xE0, 0xE0, 0xE0);
/// Muted text — secondary labels, system turns.
pub const TEXT_MUTED: Color = Color::Rgb(0x8A, 0x8A, 0x8A);
/// Dim text — disabled items, unfocused borders.
pub const TEXT_DIM: Color = Color::Rgb(0x50, 0x50, 0x50);

// ── Semantic ────────────────────────────────────────────────────────────────

/// Error — failures, rejected keys.
pub const ERROR: Color = Color::Rgb(0xEF, 0x53, 0x50);
/// Success — data loaded, request complete.
pub const SUCCESS: Color = Color::Rgb(0x66, 0xBB, 0x6A);
/// Warning — degraded status.
pub const WARNING: Color = Color::Rgb(0xFF, 0xA7, 0x26);
/// Info — informational highlights.
pub const INFO: Color = Color::Rgb(0x42, 0xA5, 0xF5);

// ── Style helpers ───────────────────────────────────────────────────────────

/// Focused border style.
pub fn border_focused() -> Style {
    Style::default().fg(PRIMARY)
}

/// Unfocused border style.
pub fn border_default() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Muted label text.
pub fn muted() -> Style {
    Style::default().fg(TEXT_MUTED)
}

/// Key hint style (e.g., "[Enter]:send").
pub fn key_hint() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Status bar brand badge.
pub fn brand_badge() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

// ── Block builders ──────────────────────────────────────────────────────────

/// A bordered block with focused styling.
pub fn block_focused(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_focused())
}

/// A bordered block with default (unfocused) styling.
pub fn block_default(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_helpers_return_non_default() {
        assert_ne!(muted(), Style::default());
        assert_ne!(key_hint(), Style::default());
        assert_ne!(brand_badge(), Style::default());
        assert_ne!(border_focused(), border_default());
    }
}
