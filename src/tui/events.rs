use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use tracing::{debug, info};
use crate::flow::{MainTab, Screen};
use crate::tui::App;
use crate::tui::app::Mode;
use crate::tui::dispatch::Dispatcher;
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::utils::key_matches;

/// Guard that ensures terminal state is restored even on panic.
/// If the terminal is left in raw mode or the alternate screen, the
/// user's shell is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore explicitly on normal exit; drop then does nothing
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already on a cleanup path; errors are ignored
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Hand queued aborts and requests to the dispatcher, then feed back
/// whatever has completed.
fn pump_requests(app: &mut App, dispatcher: &mut Dispatcher) {
    let (aborts, outbox) = app.take_requests();
    for ticket in aborts {
        dispatcher.abort(ticket);
    }
    if let Some(client) = app.client.as_ref() {
        for (ticket, request) in outbox {
            dispatcher.dispatch(client, ticket, request);
        }
    }
    for completed in dispatcher.drain() {
        app.handle_completed(completed);
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check the size before entering the alternate screen so the error
    // shows up in the normal terminal
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut dispatcher = Dispatcher::new()?;
    let mut guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    info!("tui started");

    loop {
        app.check_status_message_timeout();
        pump_requests(&mut app, &mut dispatcher);

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let show_tabs = matches!(app.screen(), Screen::Main(_));
            let layout = Layout::calculate(terminal_rect, show_tabs);
            crate::tui::render::render(f, &app, &layout);
        })?;

        // Only Press events; Windows also reports releases
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    debug!(in_flight = dispatcher.in_flight(), "tui stopping");
    guard.restore()?;
    Ok(())
}

/// Returns `Ok(true)` when the app should quit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    if app.ui.mode == Mode::Help {
        if key_event.code == KeyCode::Esc || key_matches(&app.config.key_bindings.help, &key_event) {
            app.exit_help_mode();
        }
        return Ok(false);
    }
    if key_matches(&app.config.key_bindings.help, &key_event) {
        app.enter_help_mode();
        return Ok(false);
    }

    match app.screen() {
        Screen::Login => Ok(handle_login(app, key_event)),
        Screen::Main(_) if app.home_modal.is_some() => {
            handle_home_modal(app, key_event);
            Ok(false)
        }
        Screen::Main(tab) => Ok(handle_main(app, tab, key_event)),
        Screen::TimeSelection => Ok(handle_time_step(app, key_event)),
        Screen::BeverageSelection => Ok(handle_beverage_step(app, key_event)),
    }
}

fn handle_login(app: &mut App, key_event: KeyEvent) -> bool {
    match key_event.code {
        KeyCode::Esc => return true,
        KeyCode::Enter => app.login(),
        KeyCode::Backspace => app.ui.login.delete_char(),
        KeyCode::Left => app.ui.login.move_cursor_left(),
        KeyCode::Right => app.ui.login.move_cursor_right(),
        KeyCode::Home => app.ui.login.move_cursor_home(),
        KeyCode::End => app.ui.login.move_cursor_end(),
        KeyCode::Char(ch) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.ui.login.insert_char(ch);
        }
        _ => {}
    }
    false
}

fn handle_main(app: &mut App, tab: MainTab, key_event: KeyEvent) -> bool {
    let kb = app.config.key_bindings.clone();

    if key_matches(&kb.quit, &key_event) {
        return true;
    }
    if key_matches(&kb.tab_right, &key_event) {
        app.select_tab(tab.next());
    } else if key_matches(&kb.tab_left, &key_event) {
        app.select_tab(tab.previous());
    } else if key_matches(&kb.tab_1, &key_event) {
        app.select_tab(MainTab::Home);
    } else if key_matches(&kb.tab_2, &key_event) {
        app.select_tab(MainTab::Stats);
    } else if key_matches(&kb.tab_3, &key_event) {
        app.select_tab(MainTab::My);
    } else if key_matches(&kb.new_entry, &key_event) {
        app.start_entry();
    } else if key_matches(&kb.logout, &key_event) {
        app.logout();
    } else if key_matches(&kb.cycle_theme, &key_event) {
        app.cycle_theme();
    } else {
        match tab {
            MainTab::Home => {
                if key_matches(&kb.previous_day, &key_event) {
                    app.change_day(-1);
                } else if key_matches(&kb.next_day, &key_event) {
                    app.change_day(1);
                } else if key_matches(&kb.edit_goal, &key_event) {
                    app.open_goal_modal();
                } else if key_matches(&kb.record_sleep, &key_event) {
                    app.open_sleep_modal();
                } else if key_matches(&kb.refresh, &key_event) {
                    app.refresh_home();
                }
            }
            MainTab::Stats => {
                if key_event.code == KeyCode::Tab {
                    app.toggle_stats_series();
                } else if key_matches(&kb.list_down, &key_event) || key_event.code == KeyCode::Down {
                    app.change_stats_period(true);
                } else if key_matches(&kb.list_up, &key_event) || key_event.code == KeyCode::Up {
                    app.change_stats_period(false);
                } else if key_matches(&kb.refresh, &key_event) {
                    app.refresh_stats();
                } else if key_event.code == KeyCode::PageDown {
                    app.stats.scroll += 1;
                } else if key_event.code == KeyCode::PageUp {
                    app.stats.scroll = app.stats.scroll.saturating_sub(1);
                }
            }
            MainTab::My => {}
        }
    }
    false
}

fn handle_home_modal(app: &mut App, key_event: KeyEvent) {
    let kb = &app.config.key_bindings;
    if key_event.code == KeyCode::Esc {
        app.close_modal();
    } else if key_matches(&kb.select, &key_event) {
        app.confirm_modal();
    } else if key_event.code == KeyCode::Up || key_matches(&kb.list_up, &key_event) {
        app.adjust_modal(1);
    } else if key_event.code == KeyCode::Down || key_matches(&kb.list_down, &key_event) {
        app.adjust_modal(-1);
    } else if matches!(key_event.code, KeyCode::Left | KeyCode::Right | KeyCode::Tab) {
        app.toggle_modal_field();
    }
}

fn handle_time_step(app: &mut App, key_event: KeyEvent) -> bool {
    let kb = &app.config.key_bindings;
    if key_event.code == KeyCode::Esc {
        app.cancel_time();
    } else if key_matches(&kb.select, &key_event) {
        app.confirm_time();
    } else if key_event.code == KeyCode::Up || key_matches(&kb.list_up, &key_event) {
        if let Some(step) = app.time_step.as_mut() {
            step.adjust(1);
        }
    } else if key_event.code == KeyCode::Down || key_matches(&kb.list_down, &key_event) {
        if let Some(step) = app.time_step.as_mut() {
            step.adjust(-1);
        }
    } else if matches!(key_event.code, KeyCode::Left | KeyCode::Right | KeyCode::Tab) {
        if let Some(step) = app.time_step.as_mut() {
            step.toggle_field();
        }
    }
    false
}

fn handle_beverage_step(app: &mut App, key_event: KeyEvent) -> bool {
    let kb = app.config.key_bindings.clone();
    if key_event.code == KeyCode::Esc {
        app.cancel_beverage();
        return false;
    }
    if key_matches(&kb.save, &key_event) {
        app.save_beverage();
        return false;
    }

    let Some(form) = app.beverage.as_mut() else {
        return false;
    };
    let result = match key_event.code {
        KeyCode::Tab => {
            form.next_section();
            Ok(())
        }
        KeyCode::BackTab => {
            form.previous_section();
            Ok(())
        }
        _ if form.section.is_text() => match key_event.code {
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Left => {
                form.move_text_cursor(false);
                Ok(())
            }
            KeyCode::Right => {
                form.move_text_cursor(true);
                Ok(())
            }
            KeyCode::Enter => {
                form.next_section();
                Ok(())
            }
            KeyCode::Char(ch) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                form.insert_char(ch)
            }
            _ => Ok(()),
        },
        KeyCode::Up => {
            form.move_cursor(-1);
            Ok(())
        }
        KeyCode::Down => {
            form.move_cursor(1);
            Ok(())
        }
        _ if key_matches(&kb.list_up, &key_event) => {
            form.move_cursor(-1);
            Ok(())
        }
        _ if key_matches(&kb.list_down, &key_event) => {
            form.move_cursor(1);
            Ok(())
        }
        _ if key_matches(&kb.select, &key_event) => form.choose(),
        _ => Ok(()),
    };

    if let Err(e) = result {
        app.set_status_message(e.to_string());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::utils::Profile;
    use crate::Config;
    use chrono::NaiveDate;

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn app() -> App {
        App::new(
            Config::default(),
            Profile::Dev,
            Some(ApiClient::new("http://127.0.0.1:9")),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    #[test]
    fn keyboard_walkthrough_logs_a_preset_drink() {
        let mut app = app();
        type_text(&mut app, "sleeper");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Main(MainTab::Home));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::TimeSelection);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::BeverageSelection);

        // Category list: 커피, 차, ...
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert!(app.beverage.as_ref().unwrap().step.can_save());

        app.take_requests();
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();
        let (_, outbox) = app.take_requests();
        assert_eq!(outbox.len(), 1);
        assert!(app.beverage.as_ref().unwrap().step.is_submitting());
    }

    #[test]
    fn escape_walks_back_through_capture() {
        let mut app = app();
        type_text(&mut app, "sleeper");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.screen(), Screen::Main(MainTab::Stats));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::TimeSelection);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Main(MainTab::Stats));
    }

    #[test]
    fn quit_key_is_text_on_login() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.ui.login.as_str(), "q");
        assert!(press(&mut app, KeyCode::Esc));
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut app = app();
        press(&mut app, KeyCode::F(1));
        assert_eq!(app.ui.mode, Mode::Help);
        press(&mut app, KeyCode::Char('x'));
        assert!(app.ui.login.is_empty());
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.mode, Mode::View);
    }

    #[test]
    fn time_step_keys_adjust_the_hour() {
        let mut app = app();
        type_text(&mut app, "sleeper");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('n'));
        let before = app.time_step.as_ref().unwrap().time();
        press(&mut app, KeyCode::Up);
        let after = app.time_step.as_ref().unwrap().time();
        use chrono::Timelike;
        assert_eq!(after.hour(), (before.hour() + 1) % 24);
        assert_eq!(after.minute(), before.minute());
    }
}
