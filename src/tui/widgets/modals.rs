use ratatui::layout::Alignment;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use crate::Config;
use crate::models::Condition;
use crate::tui::app::{HomeModal, SleepField};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::help::popup_area;
use crate::tui::widgets::time_picker::time_line;

fn modal_lines(modal: &HomeModal, palette: &Palette) -> (&'static str, Vec<Line<'static>>) {
    match modal {
        HomeModal::Goal(step) => (
            "Sleep goal",
            vec![
                Line::from(""),
                Line::styled("Target bed time", palette.normal()),
                Line::from(""),
                time_line(step, palette),
            ],
        ),
        HomeModal::Sleep { start, end, editing } => {
            let label = |field: SleepField, text: &'static str| {
                if *editing == field {
                    Line::styled(format!("> {}", text), palette.selected())
                } else {
                    Line::styled(format!("  {}", text), palette.muted())
                }
            };
            (
                "Last night",
                vec![
                    label(SleepField::Start, "Went to bed"),
                    time_line(start, palette),
                    Line::from(""),
                    label(SleepField::End, "Woke up"),
                    time_line(end, palette),
                ],
            )
        }
        HomeModal::Condition { selected } => {
            let mut lines = vec![Line::styled("How do you feel?", palette.normal()), Line::from("")];
            lines.extend(Condition::ALL.iter().enumerate().map(|(i, condition)| {
                if i == *selected {
                    Line::styled(format!("> {}", condition.label()), palette.selected())
                } else {
                    Line::styled(format!("  {}", condition.label()), palette.normal())
                }
            }));
            ("Condition", lines)
        }
    }
}

pub fn render_home_modal(f: &mut Frame, area: Rect, modal: &HomeModal, config: &Config) {
    let palette = Palette::from_config(config);
    let popup = popup_area(area, 50, 50);
    f.render_widget(Clear, popup);

    let (title, lines) = modal_lines(modal, &palette);
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center)
                .style(palette.normal()),
        );
    f.render_widget(paragraph, popup);
}
