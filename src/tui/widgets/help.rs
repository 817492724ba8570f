use ratatui::widgets::{Block, Borders, Paragraph, Clear, Wrap};
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment, Constraint, Layout, Flex};
use crate::Config;
use crate::tui::widgets::color::Palette;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let palette = Palette::from_config(config);
    let popup_area = popup_area(area, 60, 70);

    // Keep the screen below from showing through
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(palette.normal()))
        .style(palette.normal())
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

/// Centered rect taking the given percentage of `area`
/// Based on ratatui popup example: https://ratatui.rs/examples/apps/popup/
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Switch tabs\n", key(&kb.tab_left), key(&kb.tab_right)));
    text.push_str(&format!(
        "  {} / {} / {}: Home / Stats / My\n",
        key(&kb.tab_1),
        key(&kb.tab_2),
        key(&kb.tab_3)
    ));
    text.push_str(&format!("  {} / {}: Move up/down\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {}: Select\n", key(&kb.select)));
    text.push('\n');

    text.push_str("Home:\n");
    text.push_str(&format!("  {}: Log a drink\n", key(&kb.new_entry)));
    text.push_str(&format!("  {} / {}: Previous / next day\n", key(&kb.previous_day), key(&kb.next_day)));
    text.push_str(&format!("  {}: Edit sleep goal\n", key(&kb.edit_goal)));
    text.push_str(&format!("  {}: Record sleep and condition\n", key(&kb.record_sleep)));
    text.push_str(&format!("  {}: Reload\n", key(&kb.refresh)));
    text.push('\n');

    text.push_str("Logging a drink:\n");
    text.push_str("  Up/Down: Change hour or minute\n");
    text.push_str("  Left/Right: Switch hour/minute\n");
    text.push_str("  Tab / Shift+Tab: Next / previous section\n");
    text.push_str(&format!("  {}: Save\n", key(&kb.save)));
    text.push_str("  Esc: Back\n");
    text.push('\n');

    text.push_str("Stats:\n");
    text.push_str("  Tab: Sleep / caffeine\n");
    text.push_str(&format!("  {} / {}: Change period\n", key(&kb.list_up), key(&kb.list_down)));
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));
    text.push_str(&format!("  {}: Next theme\n", key(&kb.cycle_theme)));
    text.push_str(&format!("  {}: Sign out\n", key(&kb.logout)));

    text
}
