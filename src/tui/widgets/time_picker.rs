use ratatui::layout::{Alignment, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use crate::capture::{TimeField, TimeStep};
use crate::Config;
use crate::tui::widgets::color::Palette;
use crate::utils::{AM_LABEL, PM_LABEL};

/// The hour and minute of `step` as a line, focused field highlighted
pub fn time_line(step: &TimeStep, palette: &Palette) -> Line<'static> {
    use chrono::Timelike;
    let time = step.time();
    let (is_pm, hour12) = time.hour12();
    let meridiem = if is_pm { PM_LABEL } else { AM_LABEL };
    let style_for = |field: TimeField| {
        if step.field == field {
            palette.selected()
        } else {
            palette.normal().add_modifier(Modifier::BOLD)
        }
    };
    Line::from(vec![
        Span::styled(format!("{} ", meridiem), palette.normal()),
        Span::styled(format!("{:>2}", hour12), style_for(TimeField::Hour)),
        Span::styled(":", palette.normal()),
        Span::styled(format!("{:02}", time.minute()), style_for(TimeField::Minute)),
    ])
}

/// First capture step: when was the drink taken
pub fn render_time_step(f: &mut Frame, area: Rect, step: &TimeStep, config: &Config) {
    let palette = Palette::from_config(config);
    let date = step.confirm().format("%Y-%m-%d").to_string();
    let lines = vec![
        Line::from(""),
        Line::styled("When did you have it?", palette.normal()),
        Line::from(""),
        time_line(step, &palette),
        Line::from(""),
        Line::styled(date, palette.muted()),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("New entry - time")
                .style(palette.normal()),
        );
    f.render_widget(paragraph, area);
}
