use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use crate::Config;
use crate::models::AuthParams;
use crate::tui::widgets::color::Palette;
use crate::utils::format_key_binding_for_display;

fn row(label: &'static str, value: String, palette: &Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), palette.muted()),
        Span::styled(value, palette.normal()),
    ])
}

/// My tab: account, server, config location and theme
pub fn render_my_page(
    f: &mut Frame,
    area: Rect,
    auth: Option<&AuthParams>,
    api_url: Option<&str>,
    config_path: Option<&std::path::Path>,
    entry_count: usize,
    config: &Config,
) {
    let palette = Palette::from_config(config);
    let kb = &config.key_bindings;
    let lines = vec![
        row("User", auth.map(|a| a.user_id.clone()).unwrap_or_else(|| "-".to_string()), &palette),
        row(
            "Token",
            if auth.is_some_and(|a| a.token.is_some()) { "set" } else { "none" }.to_string(),
            &palette,
        ),
        row("Server", api_url.unwrap_or("not configured").to_string(), &palette),
        row(
            "Config",
            config_path.map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string()),
            &palette,
        ),
        row("Logged", format!("{} this session", entry_count), &palette),
        Line::from(""),
        row(
            "Theme",
            format!("{} ({} to change)", config.current_theme, format_key_binding_for_display(&kb.cycle_theme)),
            &palette,
        ),
        Line::from(""),
        Line::styled(
            format!("{}: Sign out", format_key_binding_for_display(&kb.logout)),
            palette.muted(),
        ),
    ];
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("My")
                .style(palette.normal()),
        ),
        area,
    );
}
