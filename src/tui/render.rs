use ratatui::Frame;
use ratatui::layout::{Alignment, Position};
use ratatui::widgets::{Block, Borders};
use crate::Config;
use crate::flow::{MainTab, Screen};
use crate::tui::app::Mode;
use crate::tui::dispatch::RequestKind;
use crate::tui::{App, Layout};
use crate::tui::widgets::{
    beverage::render_beverage_step,
    color::Palette,
    help::render_help,
    home::render_home,
    login::render_login,
    modals::render_home_modal,
    my_page::render_my_page,
    stats_view::render_stats,
    status_bar::render_status_bar,
    tabs::render_tabs,
    time_picker::render_time_step,
};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &App, layout: &Layout) {
    let palette = Palette::from_config(&app.config);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("sleeplog")
        .title_alignment(Alignment::Center)
        .style(palette.normal());
    f.render_widget(outer_block, f.area());

    let api_url = app.client.as_ref().map(|c| c.base_url());
    let mut cursor = None;

    match app.screen() {
        Screen::Login => {
            cursor = render_login(f, layout.main_area, &app.ui.login, api_url, &app.config);
        }
        Screen::Main(tab) => {
            render_tabs(f, layout.tabs_area, tab, &app.config);
            match tab {
                MainTab::Home => render_home(
                    f,
                    layout.main_area,
                    &app.home,
                    app.flow.entries(),
                    app.flow.total_mg(),
                    &app.config,
                ),
                MainTab::Stats => render_stats(f, layout.main_area, &app.stats, &app.config),
                MainTab::My => {
                    let config_path = Config::get_config_path(app.profile).ok();
                    render_my_page(
                        f,
                        layout.main_area,
                        app.flow.auth(),
                        api_url,
                        config_path.as_deref(),
                        app.flow.entries().len(),
                        &app.config,
                    )
                }
            }
            if let Some(modal) = &app.home_modal {
                render_home_modal(f, f.area(), modal, &app.config);
            }
        }
        Screen::TimeSelection => {
            if let Some(step) = &app.time_step {
                render_time_step(f, layout.main_area, step, &app.config);
            }
        }
        Screen::BeverageSelection => {
            if let Some(form) = &app.beverage {
                cursor = render_beverage_step(f, layout.main_area, form, &app.config);
            }
        }
    }

    if app.ui.mode == Mode::Help {
        render_help(f, f.area(), &app.config);
        cursor = None;
    }

    if let Some((x, y)) = cursor {
        f.set_cursor_position(Position::new(x, y));
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_deref(), &key_hints, &app.config);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    if app.ui.mode == Mode::Help {
        return vec![format!("Esc or {}: Exit help", key(&kb.help))];
    }
    match app.screen() {
        Screen::Login => vec![
            "Enter: Sign in".to_string(),
            "Esc: Quit".to_string(),
            format!("{}: Help", key(&kb.help)),
        ],
        Screen::Main(_) if app.home_modal.is_some() => vec![
            "Up/Down: Change".to_string(),
            "Left/Right: Hour/minute".to_string(),
            format!("{}: Confirm", key(&kb.select)),
            "Esc: Close".to_string(),
        ],
        Screen::Main(tab) => {
            let mut hints = vec![
                format!("{}: Quit", key(&kb.quit)),
                format!("{}: Log drink", key(&kb.new_entry)),
            ];
            match tab {
                MainTab::Home => {
                    hints.push(format!("{}/{}: Day", key(&kb.previous_day), key(&kb.next_day)));
                    hints.push(format!("{}: Goal", key(&kb.edit_goal)));
                    hints.push(format!("{}: Sleep", key(&kb.record_sleep)));
                    hints.push(format!("{}: Reload", key(&kb.refresh)));
                }
                MainTab::Stats => {
                    hints.push("Tab: Series".to_string());
                    hints.push(format!("{}/{}: Period", key(&kb.list_up), key(&kb.list_down)));
                    hints.push(format!("{}: Reload", key(&kb.refresh)));
                }
                MainTab::My => {
                    hints.push(format!("{}: Theme", key(&kb.cycle_theme)));
                    hints.push(format!("{}: Sign out", key(&kb.logout)));
                }
            }
            hints.push(format!("{}: Help", key(&kb.help)));
            hints
        }
        Screen::TimeSelection => vec![
            "Up/Down: Change".to_string(),
            "Left/Right: Hour/minute".to_string(),
            format!("{}: Next", key(&kb.select)),
            "Esc: Cancel".to_string(),
        ],
        Screen::BeverageSelection => {
            let save = if app.requests.is_pending(RequestKind::AddCaffeine) {
                "Saving...".to_string()
            } else {
                format!("{}: Save", key(&kb.save))
            };
            vec![
                "Tab/Shift+Tab: Section".to_string(),
                format!("{}: Choose", key(&kb.select)),
                save,
                "Esc: Back".to_string(),
            ]
        }
    }
}
