use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use crate::Config;
use crate::capture::Draft;
use crate::tui::app::{BeverageForm, BeverageSection};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::text_input::render_text_input;

/// Second capture step. Returns the cursor position when a text field is
/// focused.
pub fn render_beverage_step(
    f: &mut Frame,
    area: Rect,
    form: &BeverageForm,
    config: &Config,
) -> Option<(u16, u16)> {
    let palette = Palette::from_config(config);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("New entry - {}", form.step.intake_time().format("%Y-%m-%d %H:%M")))
        .style(palette.normal());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [body, footer] = Layout::vertical([Constraint::Min(3), Constraint::Length(2)]).areas(inner);

    let sections = form.sections();
    let columns = Layout::horizontal(vec![Constraint::Ratio(1, sections.len() as u32); sections.len()])
        .split(body);

    let mut cursor = None;
    for (section, column) in sections.iter().zip(columns.iter()) {
        let focused = *section == form.section;
        if section.is_text() {
            let [input_area, _] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(*column);
            let input = match section {
                BeverageSection::Name => &form.name,
                _ => &form.amount,
            };
            let position = render_text_input(f, input_area, section.title(), input, focused, config);
            if focused {
                cursor = position;
            }
        } else {
            render_option_list(f, *column, form, *section, focused, &palette);
        }
    }

    render_footer(f, footer, form, &palette);
    cursor
}

fn render_option_list(
    f: &mut Frame,
    area: Rect,
    form: &BeverageForm,
    section: BeverageSection,
    focused: bool,
    palette: &Palette,
) {
    let chosen = form.chosen(section);
    let items: Vec<ListItem> = form
        .options(section)
        .iter()
        .enumerate()
        .map(|(i, (_, label))| {
            let marker = if chosen == Some(i) { "● " } else { "○ " };
            ListItem::new(format!("{}{}", marker, label))
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(palette.highlight_bg)
    } else {
        Style::default().fg(palette.fg)
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(section.title())
                .border_style(border_style),
        )
        .style(palette.normal())
        .highlight_style(palette.selected());

    let mut state = ListState::default();
    if focused {
        state.select(Some(form.cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn summary(form: &BeverageForm) -> String {
    match form.step.draft() {
        None => "Choose a category".to_string(),
        Some(Draft::Coffee { brand, drink, size }) => {
            let part = |value: Option<&str>| value.unwrap_or("-").to_string();
            format!(
                "{} / {} / {}",
                part(brand.map(|b| b.store_name)),
                part(drink.map(|d| d.name)),
                part(size.map(|s| s.label))
            )
        }
        Some(Draft::Preset { category, drink }) => {
            format!("{} / {}", category.label(), drink.map(|d| d.name).unwrap_or("-"))
        }
        Some(Draft::Other { name, amount }) => {
            let name = if name.trim().is_empty() { "-" } else { name.trim() };
            let amount = if amount.trim().is_empty() { "-" } else { amount.trim() };
            format!("{} / {} mg", name, amount)
        }
    }
}

fn render_footer(f: &mut Frame, area: Rect, form: &BeverageForm, palette: &Palette) {
    let state = if form.step.is_submitting() {
        Line::styled("Saving...", palette.muted())
    } else if let Some(error) = form.step.error() {
        Line::styled(error.to_string(), palette.selected())
    } else if form.step.can_save() {
        Line::styled("Ready to save", palette.normal())
    } else {
        Line::styled("Save is disabled until the selection is complete", palette.muted())
    };
    let lines = vec![Line::styled(summary(form), palette.normal()), state];
    f.render_widget(Paragraph::new(lines).style(palette.normal()), area);
}
