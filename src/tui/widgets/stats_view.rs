use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;
use crate::Config;
use crate::stats::{StatsPeriod, StatsSeries};
use crate::tui::app::StatsState;
use crate::tui::widgets::color::Palette;

pub fn render_stats(f: &mut Frame, area: Rect, stats: &StatsState, config: &Config) {
    let palette = Palette::from_config(config);
    let [header, body] = Layout::vertical([Constraint::Length(2), Constraint::Min(1)]).areas(area);

    let series_titles: Vec<Line> = StatsSeries::ALL.iter().map(|s| Line::from(s.label())).collect();
    let series_index = StatsSeries::ALL.iter().position(|s| *s == stats.series).unwrap_or(0);
    let [series_area, period_area] = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(header);
    f.render_widget(
        Tabs::new(series_titles)
            .select(series_index)
            .style(palette.normal())
            .highlight_style(palette.selected()),
        series_area,
    );

    let current = stats.period(stats.series);
    let periods: Vec<Span> = StatsPeriod::ALL
        .iter()
        .flat_map(|p| {
            let style = if *p == current { palette.selected() } else { palette.muted() };
            [Span::styled(format!(" {} ", p.label()), style), Span::raw(" ")]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(periods)).style(palette.normal()), period_area);

    let lines: Vec<Line> = match stats.view(stats.series) {
        None => vec![Line::styled("No data loaded", palette.muted())],
        Some(view) if view.loading => vec![Line::styled("Loading...", palette.muted())],
        Some(view) => match &view.error {
            Some(error) => vec![Line::styled(format!("Failed to load: {}", error), palette.selected())],
            None if view.lines.is_empty() => vec![Line::styled("No records for this period", palette.muted())],
            None => view
                .lines
                .iter()
                .skip(stats.scroll)
                .map(|l| Line::styled(l.clone(), palette.normal()))
                .collect(),
        },
    };
    let title = format!("{} - {}", stats.series.label(), current.label());
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(palette.normal()),
        ),
        body,
    );
}
