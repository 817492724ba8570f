use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use crate::Config;
use crate::tui::widgets::color::parse_color;

/// Single-line editor used for the login id and the custom drink fields.
/// The cursor is a char index, not a byte offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_string(value: String) -> Self {
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    /// Delete the char before the cursor (Backspace)
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_index(self.cursor - 1);
        self.value.remove(at);
        self.cursor -= 1;
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// Render `input` in a bordered box. Returns the screen cursor position
/// when focused so the caller can place the terminal cursor.
pub fn render_text_input(
    f: &mut Frame,
    area: Rect,
    title: &str,
    input: &TextInput,
    focused: bool,
    config: &Config,
) -> Option<(u16, u16)> {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let border_color = if focused {
        parse_color(&active_theme.highlight_bg)
    } else {
        fg_color
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    // Scroll so the cursor stays visible in narrow boxes
    let scroll = input.cursor().saturating_sub(inner_width.saturating_sub(1));
    let visible: String = input.as_str().chars().skip(scroll).take(inner_width).collect();

    let paragraph = Paragraph::new(visible)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(Style::default().fg(border_color)),
        )
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(paragraph, area);

    if focused && area.width > 2 && area.height > 2 {
        let x = area.x + 1 + (input.cursor() - scroll) as u16;
        Some((x.min(area.x + area.width - 2), area.y + 1))
    } else {
        None
    }
}
