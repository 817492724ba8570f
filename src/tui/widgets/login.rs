use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use crate::Config;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::help::popup_area;
use crate::tui::widgets::text_input::{render_text_input, TextInput};

/// Sign-in box. Returns the cursor position for the id field.
pub fn render_login(
    f: &mut Frame,
    area: Rect,
    user_id: &TextInput,
    api_url: Option<&str>,
    config: &Config,
) -> Option<(u16, u16)> {
    let palette = Palette::from_config(config);
    let popup = popup_area(area, 60, 60);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Sign in")
        .title_alignment(Alignment::Center)
        .style(palette.normal());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let [intro, input, server, _] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .areas(inner);

    f.render_widget(
        Paragraph::new("Track sleep and caffeine.").style(palette.normal()),
        intro,
    );
    let cursor = render_text_input(f, input, "User id", user_id, true, config);

    let server_text = match api_url {
        Some(url) => format!("Server: {}", url),
        None => "Server: not configured".to_string(),
    };
    f.render_widget(Paragraph::new(server_text).style(palette.muted()), server);

    cursor
}
