use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;
use crate::Config;
use crate::home::HomeState;
use crate::models::CaffeineEntry;
use crate::stats::flatten_json;
use crate::tui::widgets::color::Palette;
use crate::utils::format_time_label;

fn sleep_lines(home: &HomeState, palette: &Palette) -> Vec<Line<'static>> {
    let time = |t: Option<chrono::NaiveTime>| t.map(format_time_label).unwrap_or_else(|| "-".to_string());
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Sleep goal  ", palette.muted()),
            Span::styled(format_time_label(home.goal), palette.normal()),
        ]),
        Line::from(vec![
            Span::styled("Condition   ", palette.muted()),
            Span::styled(home.condition_temp_label(), palette.normal()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Bed time    ", palette.muted()),
            Span::styled(time(home.sleep.start), palette.normal()),
        ]),
        Line::from(vec![
            Span::styled("Wake time   ", palette.muted()),
            Span::styled(time(home.sleep.end), palette.normal()),
        ]),
        Line::from(vec![
            Span::styled("Feeling     ", palette.muted()),
            Span::styled(
                home.sleep.condition.map(|c| c.label()).unwrap_or("-").to_string(),
                palette.normal(),
            ),
        ]),
    ];
    if let Some(summary) = &home.summary {
        lines.push(Line::from(""));
        lines.push(Line::styled("Analysis", palette.muted()));
        lines.extend(flatten_json(summary).into_iter().map(|l| Line::styled(l, palette.normal())));
    }
    lines
}

/// Home tab: the day's sleep readings next to the drinks logged this session
pub fn render_home(
    f: &mut Frame,
    area: Rect,
    home: &HomeState,
    entries: &[CaffeineEntry],
    total_mg: u32,
    config: &Config,
) {
    let palette = Palette::from_config(config);
    let [left, right] = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let sleep = Paragraph::new(sleep_lines(home, &palette))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(home.date_label())
                .style(palette.normal()),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(sleep, left);

    let items: Vec<ListItem> = if entries.is_empty() {
        vec![ListItem::new(Line::styled("Nothing logged yet", palette.muted()))]
    } else {
        entries
            .iter()
            .rev()
            .map(|entry| {
                let amount = entry.mg.map(|mg| format!(" {} mg", mg)).unwrap_or_default();
                ListItem::new(format!(
                    "{}  {} · {}{}",
                    entry.time_label(),
                    entry.beverage,
                    entry.store_name,
                    amount
                ))
            })
            .collect()
    };
    let title = if total_mg > 0 {
        format!("Caffeine ({} mg known)", total_mg)
    } else {
        "Caffeine".to_string()
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(palette.normal()),
    );
    f.render_widget(list, right);
}
