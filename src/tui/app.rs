use crate::api::ApiClient;
use crate::capture::{BeverageStep, Draft, SelectionError, SubmitOutcome, TimeStep};
use crate::catalog::{self, Category, COFFEE_BRANDS};
use crate::flow::{Flow, FlowEvent, MainTab, Screen};
use crate::home::HomeState;
use crate::models::{AuthParams, Condition, Ticket};
use crate::stats::{flatten_json, StatsPeriod, StatsSeries};
use crate::tui::dispatch::{ApiRequest, ApiResponse, Completed, RequestKind};
use crate::tui::widgets::text_input::TextInput;
use crate::utils::{local_datetime, Profile};
use crate::Config;
use chrono::{Local, NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Help,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub mode: Mode,
    pub login: TextInput,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

/// Parts of the beverage step the user moves between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeverageSection {
    Category,
    Brand,
    Drink,
    Size,
    Name,
    Amount,
}

impl BeverageSection {
    pub fn title(self) -> &'static str {
        match self {
            BeverageSection::Category => "Category",
            BeverageSection::Brand => "Brand",
            BeverageSection::Drink => "Drink",
            BeverageSection::Size => "Size",
            BeverageSection::Name => "Name",
            BeverageSection::Amount => "Caffeine (mg)",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, BeverageSection::Name | BeverageSection::Amount)
    }
}

/// Beverage step plus the cursor state needed to drive it from the keyboard
#[derive(Debug, Clone)]
pub struct BeverageForm {
    pub step: BeverageStep,
    pub section: BeverageSection,
    pub cursor: usize,
    pub name: TextInput,
    pub amount: TextInput,
}

impl BeverageForm {
    pub fn new(step: BeverageStep) -> Self {
        Self {
            step,
            section: BeverageSection::Category,
            cursor: 0,
            name: TextInput::new(),
            amount: TextInput::new(),
        }
    }

    /// Sections visible for the current draft, in display order
    pub fn sections(&self) -> Vec<BeverageSection> {
        let mut sections = vec![BeverageSection::Category];
        match self.step.draft() {
            None => {}
            Some(Draft::Coffee { brand, drink, .. }) => {
                sections.push(BeverageSection::Brand);
                if brand.is_some() {
                    sections.push(BeverageSection::Drink);
                }
                if drink.is_some() {
                    sections.push(BeverageSection::Size);
                }
            }
            Some(Draft::Preset { .. }) => sections.push(BeverageSection::Drink),
            Some(Draft::Other { .. }) => {
                sections.push(BeverageSection::Name);
                sections.push(BeverageSection::Amount);
            }
        }
        sections
    }

    /// `(id, label)` pairs listed in a list section
    pub fn options(&self, section: BeverageSection) -> Vec<(&'static str, &'static str)> {
        match (section, self.step.draft()) {
            (BeverageSection::Category, _) => {
                Category::ALL.iter().map(|c| (c.id(), c.label())).collect()
            }
            (BeverageSection::Brand, _) => {
                COFFEE_BRANDS.iter().map(|b| (b.id, b.store_name)).collect()
            }
            (BeverageSection::Drink, Some(Draft::Coffee { brand: Some(brand), .. })) => {
                brand.menu.iter().map(|d| (d.id, d.name)).collect()
            }
            (BeverageSection::Drink, Some(Draft::Preset { category, .. })) => {
                catalog::preset_drinks(*category).iter().map(|d| (d.id, d.name)).collect()
            }
            (BeverageSection::Size, Some(Draft::Coffee { brand: Some(brand), .. })) => {
                brand.sizes.iter().map(|s| (s.label, s.label)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Index of the option currently chosen in `section`, if any
    pub fn chosen(&self, section: BeverageSection) -> Option<usize> {
        let id = match (section, self.step.draft()) {
            (BeverageSection::Category, Some(draft)) => Some(draft.category().id()),
            (BeverageSection::Brand, Some(Draft::Coffee { brand, .. })) => brand.map(|b| b.id),
            (BeverageSection::Drink, Some(Draft::Coffee { drink, .. }))
            | (BeverageSection::Drink, Some(Draft::Preset { drink, .. })) => drink.map(|d| d.id),
            (BeverageSection::Size, Some(Draft::Coffee { size, .. })) => size.map(|s| s.label),
            _ => None,
        }?;
        self.options(section).iter().position(|(option, _)| *option == id)
    }

    fn focus(&mut self, section: BeverageSection) {
        self.section = section;
        self.cursor = self.chosen(section).unwrap_or(0);
    }

    pub fn next_section(&mut self) {
        let sections = self.sections();
        let idx = sections.iter().position(|s| *s == self.section).unwrap_or(0);
        self.focus(sections[(idx + 1) % sections.len()]);
    }

    pub fn previous_section(&mut self) {
        let sections = self.sections();
        let idx = sections.iter().position(|s| *s == self.section).unwrap_or(0);
        self.focus(sections[(idx + sections.len() - 1) % sections.len()]);
    }

    pub fn move_cursor(&mut self, delta: i32) {
        let len = self.options(self.section).len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as i64 + delta as i64).rem_euclid(len as i64) as usize;
    }

    /// Apply the option under the cursor and move to the next section
    pub fn choose(&mut self) -> Result<(), SelectionError> {
        let options = self.options(self.section);
        let Some((id, _)) = options.get(self.cursor).copied() else {
            return Ok(());
        };
        match self.section {
            BeverageSection::Category => {
                let category: Category = id.parse().map_err(|_| SelectionError::NoCategory)?;
                self.step.select_category(category)?;
                self.name.clear();
                self.amount.clear();
            }
            BeverageSection::Brand => self.step.select_brand(id)?,
            BeverageSection::Drink => self.step.select_drink(id)?,
            BeverageSection::Size => self.step.select_size(id)?,
            BeverageSection::Name | BeverageSection::Amount => return Ok(()),
        }
        let sections = self.sections();
        let idx = sections.iter().position(|s| *s == self.section).unwrap_or(0);
        if let Some(next) = sections.get(idx + 1).copied() {
            self.focus(next);
        }
        Ok(())
    }

    fn sync_text(&mut self) -> Result<(), SelectionError> {
        match self.section {
            BeverageSection::Name => self.step.set_custom_name(self.name.as_str()),
            BeverageSection::Amount => self.step.set_custom_amount(self.amount.as_str()),
            _ => Ok(()),
        }
    }

    fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.section {
            BeverageSection::Name => Some(&mut self.name),
            BeverageSection::Amount => Some(&mut self.amount),
            _ => None,
        }
    }

    pub fn insert_char(&mut self, ch: char) -> Result<(), SelectionError> {
        if self.step.is_submitting() {
            return Err(SelectionError::Submitting);
        }
        if let Some(input) = self.focused_input() {
            input.insert_char(ch);
        }
        self.sync_text()
    }

    pub fn delete_char(&mut self) -> Result<(), SelectionError> {
        if self.step.is_submitting() {
            return Err(SelectionError::Submitting);
        }
        if let Some(input) = self.focused_input() {
            input.delete_char();
        }
        self.sync_text()
    }

    pub fn move_text_cursor(&mut self, forward: bool) {
        if let Some(input) = self.focused_input() {
            if forward {
                input.move_cursor_right();
            } else {
                input.move_cursor_left();
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepField {
    Start,
    End,
}

/// Popups on the home tab
#[derive(Debug, Clone)]
pub enum HomeModal {
    Goal(TimeStep),
    Sleep {
        start: TimeStep,
        end: TimeStep,
        editing: SleepField,
    },
    Condition {
        selected: usize,
    },
}

/// Result of one stats query as shown on the stats tab
#[derive(Debug, Clone, Default)]
pub struct StatsView {
    pub lines: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatsState {
    pub series: StatsSeries,
    pub periods: HashMap<StatsSeries, StatsPeriod>,
    pub views: HashMap<StatsSeries, StatsView>,
    pub scroll: usize,
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            series: StatsSeries::Sleep,
            periods: StatsSeries::ALL.iter().map(|s| (*s, StatsPeriod::Weekly)).collect(),
            views: HashMap::new(),
            scroll: 0,
        }
    }
}

impl StatsState {
    pub fn period(&self, series: StatsSeries) -> StatsPeriod {
        self.periods.get(&series).copied().unwrap_or(StatsPeriod::Weekly)
    }

    pub fn view(&self, series: StatsSeries) -> Option<&StatsView> {
        self.views.get(&series)
    }
}

/// Requests produced by the UI and waiting to be handed to the dispatcher.
/// Only the newest request of each kind is honoured when it returns.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pub outbox: Vec<(Ticket, ApiRequest)>,
    pub aborts: Vec<Ticket>,
    inflight: HashMap<RequestKind, Ticket>,
}

impl RequestQueue {
    fn push(&mut self, ticket: Ticket, request: ApiRequest) {
        if let Some(previous) = self.inflight.insert(request.kind(), ticket) {
            self.aborts.push(previous);
        }
        self.outbox.push((ticket, request));
    }

    /// True when `ticket` is the live request for `kind`; clears it
    fn settle(&mut self, kind: RequestKind, ticket: Ticket) -> bool {
        if self.inflight.get(&kind) == Some(&ticket) {
            self.inflight.remove(&kind);
            true
        } else {
            false
        }
    }

    fn cancel(&mut self, kind: RequestKind) {
        if let Some(ticket) = self.inflight.remove(&kind) {
            self.aborts.push(ticket);
        }
    }

    fn cancel_all(&mut self) {
        self.aborts.extend(self.inflight.drain().map(|(_, ticket)| ticket));
        self.outbox.clear();
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.inflight.contains_key(&kind)
    }
}

pub struct App {
    // Core infrastructure
    pub config: Config,
    pub profile: Profile,
    pub client: Option<ApiClient>,

    pub flow: Flow,

    // Capture flow, present only on their screens
    pub time_step: Option<TimeStep>,
    pub beverage: Option<BeverageForm>,

    // Grouped state
    pub home: HomeState,
    pub home_modal: Option<HomeModal>,
    pub stats: StatsState,
    pub ui: UiState,
    pub status: StatusState,
    pub requests: RequestQueue,
}

impl App {
    /// `client` is `None` when no API URL could be resolved; the UI still
    /// runs and reports the problem on every network action.
    pub fn new(config: Config, profile: Profile, client: Option<ApiClient>, today: NaiveDate) -> Self {
        let login = TextInput::from_string(config.user_id.clone().unwrap_or_default());
        Self {
            config,
            profile,
            client,
            flow: Flow::new(),
            time_step: None,
            beverage: None,
            home: HomeState::new(today),
            home_modal: None,
            stats: StatsState::default(),
            ui: UiState {
                mode: Mode::View,
                login,
            },
            status: StatusState::default(),
            requests: RequestQueue::default(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.flow.screen()
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    fn send(&mut self, request: ApiRequest) -> Option<Ticket> {
        self.send_with_ticket(Ticket::next(), request)
    }

    fn send_with_ticket(&mut self, ticket: Ticket, request: ApiRequest) -> Option<Ticket> {
        if self.client.is_none() {
            self.set_status_message("API URL is not configured".to_string());
            return None;
        }
        self.requests.push(ticket, request);
        Some(ticket)
    }

    /// Hand queued work to the dispatcher: `(aborts, new requests)`
    pub fn take_requests(&mut self) -> (Vec<Ticket>, Vec<(Ticket, ApiRequest)>) {
        (
            std::mem::take(&mut self.requests.aborts),
            std::mem::take(&mut self.requests.outbox),
        )
    }

    // ---- login / session ----

    pub fn login(&mut self) {
        let user_id = self.ui.login.as_str().trim().to_string();
        if user_id.is_empty() {
            self.set_status_message("Enter a user id".to_string());
            return;
        }
        let auth = AuthParams {
            user_id,
            token: self.config.auth_token.clone(),
        };
        if let Some(client) = self.client.as_mut() {
            client.set_auth(Some(auth.clone()));
        }
        match self.flow.apply(FlowEvent::Authenticated(auth)) {
            Ok(()) => self.refresh_home(),
            Err(e) => warn!(error = %e, "login ignored"),
        }
    }

    pub fn logout(&mut self) {
        if self.flow.apply(FlowEvent::Logout).is_err() {
            return;
        }
        self.requests.cancel_all();
        if let Some(client) = self.client.as_mut() {
            client.set_auth(None);
        }
        self.time_step = None;
        self.beverage = None;
        self.home = HomeState::new(Local::now().date_naive());
        self.home_modal = None;
        self.stats = StatsState::default();
        self.set_status_message("Signed out".to_string());
    }

    pub fn select_tab(&mut self, tab: MainTab) {
        if self.flow.apply(FlowEvent::SelectTab(tab)).is_err() {
            return;
        }
        if tab == MainTab::Stats && self.stats.views.is_empty() {
            self.refresh_stats();
        }
    }

    // ---- capture flow ----

    pub fn start_entry(&mut self) {
        if self.flow.apply(FlowEvent::NewEntry).is_ok() {
            self.home_modal = None;
            self.time_step = Some(TimeStep::new(None));
        }
    }

    pub fn cancel_time(&mut self) {
        if self.flow.apply(FlowEvent::Cancel).is_ok() {
            self.time_step = None;
        }
    }

    pub fn confirm_time(&mut self) {
        let Some(step) = self.time_step.as_ref() else {
            return;
        };
        let chosen = step.confirm();
        if self.flow.apply(FlowEvent::TimeChosen(chosen)).is_ok() {
            self.time_step = None;
            self.beverage = Some(BeverageForm::new(BeverageStep::new(chosen)));
        }
    }

    /// Back to the time step. An in-flight submission is abandoned.
    pub fn cancel_beverage(&mut self) {
        if self.flow.apply(FlowEvent::Cancel).is_err() {
            return;
        }
        if let Some(mut form) = self.beverage.take() {
            if let Some(ticket) = form.step.cancel() {
                info!(ticket = ticket.value(), "submission abandoned");
                self.requests.cancel(RequestKind::AddCaffeine);
            }
        }
        self.time_step = Some(TimeStep::new(self.flow.intake_time()));
    }

    pub fn save_beverage(&mut self) {
        let Some(form) = self.beverage.as_mut() else {
            return;
        };
        if form.step.is_submitting() {
            self.set_status_message("Saving...".to_string());
            return;
        }
        let Some(submission) = form.step.begin_submit() else {
            self.set_status_message("Complete the selection first".to_string());
            return;
        };
        if self.client.is_none() {
            let outcome = form
                .step
                .finish_submit(submission.ticket, Err("API URL is not configured"));
            self.apply_submit_outcome(outcome);
            return;
        }
        self.send_with_ticket(submission.ticket, ApiRequest::AddCaffeine(submission.payload));
    }

    fn apply_submit_outcome(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Saved(entry) => {
                let message = format!("Saved {} at {}", entry.beverage, entry.time_label());
                if let Err(e) = self.flow.apply(FlowEvent::Saved(entry)) {
                    warn!(error = %e, "saved entry outside the beverage step");
                    return;
                }
                self.beverage = None;
                self.set_status_message(message);
            }
            SubmitOutcome::Failed => {
                let message = self
                    .beverage
                    .as_ref()
                    .and_then(|f| f.step.error())
                    .map(str::to_string);
                if let Some(message) = message {
                    self.set_status_message(message);
                }
            }
            SubmitOutcome::Stale => debug!("stale submission result dropped"),
        }
    }

    // ---- home ----

    pub fn refresh_home(&mut self) {
        let date = self.home.date;
        self.send(ApiRequest::SleepGoal(date));
        self.send(ApiRequest::ConditionTemp(date));
    }

    pub fn change_day(&mut self, days: i64) {
        self.home.change_date(days);
        self.refresh_home();
    }

    pub fn open_goal_modal(&mut self) {
        let step = TimeStep::new(Some(local_datetime(self.home.date, self.home.goal)));
        self.home_modal = Some(HomeModal::Goal(step));
    }

    pub fn open_sleep_modal(&mut self) {
        let wake_default = NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN);
        let start_time = self.home.sleep.start.unwrap_or(self.home.goal);
        let end_time = self.home.sleep.end.unwrap_or(wake_default);
        let mut start = TimeStep::new(Some(local_datetime(self.home.date, start_time)));
        start.set_time(start_time);
        let mut end = TimeStep::new(Some(local_datetime(self.home.date, end_time)));
        end.set_time(end_time);
        self.home_modal = Some(HomeModal::Sleep {
            start,
            end,
            editing: SleepField::Start,
        });
    }

    pub fn close_modal(&mut self) {
        self.home_modal = None;
    }

    /// Enter inside a home modal
    pub fn confirm_modal(&mut self) {
        match self.home_modal.take() {
            Some(HomeModal::Goal(step)) => {
                self.send(ApiRequest::SetSleepGoal(self.home.date, step.time()));
            }
            Some(HomeModal::Sleep {
                start,
                end,
                editing: SleepField::Start,
            }) => {
                self.home_modal = Some(HomeModal::Sleep {
                    start,
                    end,
                    editing: SleepField::End,
                });
            }
            Some(HomeModal::Sleep { start, end, .. }) => {
                self.home.sleep.start = Some(start.time());
                self.home.sleep.end = Some(end.time());
                let selected = self
                    .home
                    .sleep
                    .condition
                    .and_then(|c| Condition::ALL.iter().position(|x| *x == c))
                    .unwrap_or(0);
                self.home_modal = Some(HomeModal::Condition { selected });
            }
            Some(HomeModal::Condition { selected }) => {
                self.home.sleep.condition = Condition::ALL.get(selected).copied();
                self.submit_sleep();
            }
            None => {}
        }
    }

    /// Up/Down inside a home modal
    pub fn adjust_modal(&mut self, delta: i32) {
        match self.home_modal.as_mut() {
            Some(HomeModal::Goal(step)) => step.adjust(delta),
            Some(HomeModal::Sleep {
                start,
                end,
                editing,
            }) => match editing {
                SleepField::Start => start.adjust(delta),
                SleepField::End => end.adjust(delta),
            },
            Some(HomeModal::Condition { selected }) => {
                let len = Condition::ALL.len() as i64;
                // Up moves towards the top of the list
                *selected = (*selected as i64 - delta as i64).rem_euclid(len) as usize;
            }
            None => {}
        }
    }

    /// Left/Right inside a home modal
    pub fn toggle_modal_field(&mut self) {
        match self.home_modal.as_mut() {
            Some(HomeModal::Goal(step)) => step.toggle_field(),
            Some(HomeModal::Sleep {
                start,
                end,
                editing,
            }) => match editing {
                SleepField::Start => start.toggle_field(),
                SleepField::End => end.toggle_field(),
            },
            _ => {}
        }
    }

    fn submit_sleep(&mut self) {
        let Some(user_id) = self.flow.auth().map(|a| a.user_id.clone()) else {
            return;
        };
        match self.home.sleep.summary_request(&user_id, self.home.date) {
            Some(request) => {
                self.send(ApiRequest::DailySummary(self.home.date, request));
            }
            None => self.set_status_message("Sleep record is incomplete".to_string()),
        }
    }

    // ---- stats ----

    pub fn refresh_stats(&mut self) {
        for series in StatsSeries::ALL {
            self.refresh_stats_series(series);
        }
    }

    fn refresh_stats_series(&mut self, series: StatsSeries) {
        let period = self.stats.period(series);
        if self.send(ApiRequest::Stats(series, period)).is_some() {
            let view = self.stats.views.entry(series).or_default();
            view.loading = true;
            view.error = None;
        }
    }

    pub fn toggle_stats_series(&mut self) {
        let idx = StatsSeries::ALL
            .iter()
            .position(|s| *s == self.stats.series)
            .unwrap_or(0);
        self.stats.series = StatsSeries::ALL[(idx + 1) % StatsSeries::ALL.len()];
        self.stats.scroll = 0;
    }

    pub fn change_stats_period(&mut self, forward: bool) {
        let series = self.stats.series;
        let current = self.stats.period(series);
        let period = if forward { current.next() } else { current.previous() };
        self.stats.periods.insert(series, period);
        self.stats.scroll = 0;
        self.refresh_stats_series(series);
    }

    // ---- settings ----

    pub fn cycle_theme(&mut self) {
        let next = self.config.next_theme_name();
        if let Err(e) = self.config.set_theme(&next) {
            self.set_status_message(format!("Error: {}", e));
            return;
        }
        match self.config.save_with_profile(self.profile) {
            Ok(()) => self.set_status_message(format!("Theme: {}", next)),
            Err(e) => self.set_status_message(format!("Theme applied but not saved: {}", e)),
        }
    }

    // ---- responses ----

    pub fn handle_completed(&mut self, completed: Completed) {
        let Completed { ticket, response } = completed;
        if let ApiResponse::AddCaffeine(result) = response {
            self.requests.settle(RequestKind::AddCaffeine, ticket);
            let outcome = match self.beverage.as_mut() {
                Some(form) => form.step.finish_submit(ticket, result),
                None => SubmitOutcome::Stale,
            };
            self.apply_submit_outcome(outcome);
            return;
        }

        let kind = match &response {
            ApiResponse::SleepGoal(_) => RequestKind::SleepGoal,
            ApiResponse::SetSleepGoal(..) => RequestKind::SetSleepGoal,
            ApiResponse::ConditionTemp(_) => RequestKind::ConditionTemp,
            ApiResponse::DailySummary(..) => RequestKind::DailySummary,
            ApiResponse::Stats(series, ..) => RequestKind::Stats(*series),
            ApiResponse::AddCaffeine(_) => RequestKind::AddCaffeine,
        };
        if !self.requests.settle(kind, ticket) {
            debug!(ticket = ticket.value(), kind = ?kind, "stale response dropped");
            return;
        }

        match response {
            ApiResponse::SleepGoal(Ok(goal)) => self.home.goal = goal,
            ApiResponse::SleepGoal(Err(e)) => {
                warn!(error = %e, "sleep goal lookup failed");
                self.set_status_message("Could not load sleep goal".to_string());
            }
            ApiResponse::SetSleepGoal(date, goal, Ok(())) => {
                // The day may have changed while the save was in flight
                if date == self.home.date {
                    self.home.goal = goal;
                }
                self.set_status_message("Sleep goal saved".to_string());
            }
            ApiResponse::SetSleepGoal(_, _, Err(e)) => {
                warn!(error = %e, "sleep goal update failed");
                self.set_status_message("Failed to save sleep goal".to_string());
            }
            ApiResponse::ConditionTemp(Ok(value)) => self.home.condition_temp = value,
            ApiResponse::ConditionTemp(Err(e)) => {
                warn!(error = %e, "condition lookup failed");
            }
            ApiResponse::DailySummary(date, Ok(summary)) => {
                if date == self.home.date {
                    self.home.summary = Some(summary);
                }
                self.set_status_message("Sleep analysed".to_string());
            }
            ApiResponse::DailySummary(_, Err(e)) => {
                warn!(error = %e, "daily summary failed");
                self.set_status_message("Failed to analyse sleep".to_string());
            }
            ApiResponse::Stats(series, period, result) => {
                let view = self.stats.views.entry(series).or_default();
                view.loading = false;
                match result {
                    Ok(body) => {
                        view.lines = flatten_json(&body);
                        view.error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, series = %series, period = period.label(), "stats request failed");
                        view.lines.clear();
                        view.error = Some(e.to_string());
                    }
                }
            }
            ApiResponse::AddCaffeine(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::capture::SUBMIT_FAILED_MESSAGE;

    fn app() -> App {
        let client = ApiClient::new("http://127.0.0.1:9");
        App::new(
            Config::default(),
            Profile::Dev,
            Some(client),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    fn signed_in() -> App {
        let mut app = app();
        for ch in "sleeper".chars() {
            app.ui.login.insert_char(ch);
        }
        app.login();
        app.take_requests();
        app
    }

    fn server_error() -> ApiError {
        ApiError::Server {
            status: 500,
            body: "boom".to_string(),
        }
    }

    fn at_beverage_step(app: &mut App) {
        app.start_entry();
        app.confirm_time();
        assert_eq!(app.screen(), Screen::BeverageSelection);
    }

    fn choose(form: &mut BeverageForm, label: &str) {
        let options = form.options(form.section);
        form.cursor = options
            .iter()
            .position(|(_, l)| *l == label)
            .unwrap_or_else(|| panic!("{label} not offered in {:?}", form.section));
        form.choose().unwrap();
    }

    #[test]
    fn blank_login_stays_on_login() {
        let mut app = app();
        app.login();
        assert_eq!(app.screen(), Screen::Login);
        assert!(app.status.message.is_some());
    }

    #[test]
    fn login_loads_home_readings() {
        let mut app = app();
        app.ui.login = TextInput::from_string(" sleeper ".to_string());
        app.login();
        assert_eq!(app.screen(), Screen::Main(MainTab::Home));
        assert_eq!(app.flow.auth().map(|a| a.user_id.as_str()), Some("sleeper"));
        let (_, outbox) = app.take_requests();
        let kinds: Vec<_> = outbox.iter().map(|(_, r)| r.kind()).collect();
        assert!(kinds.contains(&RequestKind::SleepGoal));
        assert!(kinds.contains(&RequestKind::ConditionTemp));
    }

    #[test]
    fn coffee_entry_saves_and_returns_home() {
        let mut app = signed_in();
        at_beverage_step(&mut app);
        let form = app.beverage.as_mut().unwrap();
        choose(form, "커피");
        assert_eq!(form.section, BeverageSection::Brand);
        choose(form, "스타벅스");
        choose(form, "아메리카노");
        assert_eq!(form.section, BeverageSection::Size);
        choose(form, "Tall");
        assert!(form.step.can_save());

        app.save_beverage();
        let (_, outbox) = app.take_requests();
        let (ticket, request) = outbox.into_iter().next().unwrap();
        match &request {
            ApiRequest::AddCaffeine(payload) => {
                assert_eq!(payload.store_name, "스타벅스");
                assert_eq!(payload.menu_name, "아메리카노");
                assert_eq!(payload.size, "Tall");
            }
            other => panic!("unexpected request {other:?}"),
        }

        app.handle_completed(Completed {
            ticket,
            response: ApiResponse::AddCaffeine(Ok(())),
        });
        assert_eq!(app.screen(), Screen::Main(MainTab::Home));
        assert_eq!(app.flow.entries().len(), 1);
        assert_eq!(app.flow.entries()[0].beverage, "아메리카노 (Tall)");
        assert!(app.beverage.is_none());
    }

    #[test]
    fn failed_save_keeps_draft_and_shows_message() {
        let mut app = signed_in();
        at_beverage_step(&mut app);
        let form = app.beverage.as_mut().unwrap();
        choose(form, "차");
        choose(form, "녹차");
        app.save_beverage();
        let (_, outbox) = app.take_requests();
        let ticket = outbox[0].0;

        app.handle_completed(Completed {
            ticket,
            response: ApiResponse::AddCaffeine(Err(server_error())),
        });
        assert_eq!(app.screen(), Screen::BeverageSelection);
        assert_eq!(app.status.message.as_deref(), Some(SUBMIT_FAILED_MESSAGE));
        assert!(app.flow.entries().is_empty());
        assert!(app.beverage.as_ref().unwrap().step.can_save());
    }

    #[test]
    fn leaving_during_submission_aborts_and_ignores_late_result() {
        let mut app = signed_in();
        at_beverage_step(&mut app);
        let form = app.beverage.as_mut().unwrap();
        choose(form, "탄산");
        choose(form, "코카콜라");
        app.save_beverage();
        let (_, outbox) = app.take_requests();
        let ticket = outbox[0].0;

        app.cancel_beverage();
        assert_eq!(app.screen(), Screen::TimeSelection);
        let (aborts, _) = app.take_requests();
        assert_eq!(aborts, vec![ticket]);

        app.confirm_time();
        app.handle_completed(Completed {
            ticket,
            response: ApiResponse::AddCaffeine(Ok(())),
        });
        assert_eq!(app.screen(), Screen::BeverageSelection);
        assert!(app.flow.entries().is_empty());
    }

    #[test]
    fn other_category_needs_name_and_amount() {
        let mut app = signed_in();
        at_beverage_step(&mut app);
        let form = app.beverage.as_mut().unwrap();
        choose(form, "기타");
        assert_eq!(form.section, BeverageSection::Name);
        for ch in "홍삼차".chars() {
            form.insert_char(ch).unwrap();
        }
        form.next_section();
        form.insert_char('0').unwrap();
        assert!(!form.step.can_save());
        form.delete_char().unwrap();
        for ch in "150".chars() {
            form.insert_char(ch).unwrap();
        }
        assert!(form.step.can_save());
    }

    #[test]
    fn sections_follow_the_draft() {
        let mut form = BeverageForm::new(BeverageStep::new(Local::now()));
        assert_eq!(form.sections(), vec![BeverageSection::Category]);
        choose(&mut form, "커피");
        assert_eq!(
            form.sections(),
            vec![BeverageSection::Category, BeverageSection::Brand]
        );
        choose(&mut form, "메가커피");
        choose(&mut form, "아메리카노");
        assert_eq!(form.sections().len(), 4);
        assert_eq!(form.options(BeverageSection::Size).len(), 2);
    }

    #[test]
    fn missing_client_fails_submission_locally() {
        let mut app = App::new(
            Config::default(),
            Profile::Dev,
            None,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        app.ui.login = TextInput::from_string("sleeper".to_string());
        app.login();
        at_beverage_step(&mut app);
        let form = app.beverage.as_mut().unwrap();
        choose(form, "에너지 드링크");
        let first = form.options(BeverageSection::Drink)[0].1;
        choose(form, first);
        app.save_beverage();
        assert_eq!(app.status.message.as_deref(), Some(SUBMIT_FAILED_MESSAGE));
        assert!(app.requests.outbox.is_empty());
        assert!(!app.beverage.as_ref().unwrap().step.is_submitting());
    }

    #[test]
    fn superseded_home_response_is_dropped() {
        let mut app = signed_in();
        app.refresh_home();
        let (_, first) = app.take_requests();
        app.change_day(-1);
        let (aborts, second) = app.take_requests();
        assert_eq!(aborts.len(), 2);

        let old_goal = first
            .iter()
            .find(|(_, r)| r.kind() == RequestKind::SleepGoal)
            .unwrap()
            .0;
        app.handle_completed(Completed {
            ticket: old_goal,
            response: ApiResponse::SleepGoal(Ok(NaiveTime::from_hms_opt(21, 0, 0).unwrap())),
        });
        assert_eq!(app.home.goal, crate::home::default_sleep_goal());

        let new_goal = second
            .iter()
            .find(|(_, r)| r.kind() == RequestKind::SleepGoal)
            .unwrap()
            .0;
        let goal = NaiveTime::from_hms_opt(22, 30, 0).unwrap();
        app.handle_completed(Completed {
            ticket: new_goal,
            response: ApiResponse::SleepGoal(Ok(goal)),
        });
        assert_eq!(app.home.goal, goal);
    }

    #[test]
    fn sleep_and_condition_modals_post_summary() {
        let mut app = signed_in();
        app.open_sleep_modal();
        app.confirm_modal();
        app.confirm_modal();
        assert!(matches!(app.home_modal, Some(HomeModal::Condition { .. })));
        app.adjust_modal(-1);
        app.confirm_modal();
        assert!(app.home_modal.is_none());
        assert_eq!(app.home.sleep.condition, Some(Condition::Normal));

        let (_, outbox) = app.take_requests();
        match &outbox[0].1 {
            ApiRequest::DailySummary(date, body) => {
                assert_eq!(*date, app.home.date);
                assert_eq!(body.user_id, "sleeper");
                assert_eq!(body.freshness, 2);
                assert!(body.sleep_start_at < body.sleep_end_at);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn goal_modal_posts_new_goal() {
        let mut app = signed_in();
        app.open_goal_modal();
        app.adjust_modal(-1);
        app.confirm_modal();
        let (_, outbox) = app.take_requests();
        let (ticket, request) = outbox.into_iter().next().unwrap();
        let expected = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        let date = app.home.date;
        assert_eq!(request, ApiRequest::SetSleepGoal(date, expected));
        app.handle_completed(Completed {
            ticket,
            response: ApiResponse::SetSleepGoal(date, expected, Ok(())),
        });
        assert_eq!(app.home.goal, expected);
    }

    #[test]
    fn goal_save_for_previous_day_does_not_touch_viewed_goal() {
        let mut app = signed_in();
        app.open_goal_modal();
        app.adjust_modal(-1);
        app.confirm_modal();
        let (_, outbox) = app.take_requests();
        let (save, request) = outbox.into_iter().next().unwrap();
        let ApiRequest::SetSleepGoal(saved_for, saved_goal) = request else {
            panic!("expected a goal save");
        };

        app.change_day(-1);
        let (_, reload) = app.take_requests();
        let lookup = reload
            .iter()
            .find(|(_, r)| r.kind() == RequestKind::SleepGoal)
            .unwrap()
            .0;
        let viewed = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        app.handle_completed(Completed {
            ticket: lookup,
            response: ApiResponse::SleepGoal(Ok(viewed)),
        });
        app.handle_completed(Completed {
            ticket: save,
            response: ApiResponse::SetSleepGoal(saved_for, saved_goal, Ok(())),
        });

        assert_ne!(saved_for, app.home.date);
        assert_eq!(app.home.goal, viewed);
        assert_eq!(app.status.message.as_deref(), Some("Sleep goal saved"));
    }

    #[test]
    fn day_change_starts_a_blank_sleep_record() {
        let mut app = signed_in();
        app.open_sleep_modal();
        app.confirm_modal();
        app.confirm_modal();
        app.adjust_modal(-1);
        app.confirm_modal();
        assert_eq!(app.home.sleep.condition, Some(Condition::Normal));
        app.take_requests();

        app.change_day(1);
        app.open_sleep_modal();
        app.confirm_modal();
        app.confirm_modal();
        assert!(matches!(app.home_modal, Some(HomeModal::Condition { selected: 0 })));
        assert_eq!(app.home.sleep.condition, None);
    }

    #[test]
    fn pending_save_is_tracked_until_its_response() {
        let mut app = signed_in();
        app.start_entry();
        app.confirm_time();
        let form = app.beverage.as_mut().unwrap();
        form.step.select_category(Category::Soda).unwrap();
        form.step.select_drink("coke").unwrap();
        app.save_beverage();
        assert!(app.requests.is_pending(RequestKind::AddCaffeine));

        let (_, outbox) = app.take_requests();
        app.handle_completed(Completed {
            ticket: outbox[0].0,
            response: ApiResponse::AddCaffeine(Ok(())),
        });
        assert!(!app.requests.is_pending(RequestKind::AddCaffeine));
        assert_eq!(app.screen(), Screen::Main(MainTab::Home));
    }

    #[test]
    fn stats_tab_loads_both_series() {
        let mut app = signed_in();
        app.select_tab(MainTab::Stats);
        let (_, outbox) = app.take_requests();
        assert_eq!(outbox.len(), 2);
        let (ticket, _) = outbox
            .iter()
            .find(|(_, r)| r.kind() == RequestKind::Stats(StatsSeries::Caffeine))
            .unwrap();
        app.handle_completed(Completed {
            ticket: *ticket,
            response: ApiResponse::Stats(
                StatsSeries::Caffeine,
                StatsPeriod::Weekly,
                Ok(serde_json::json!({"total": 320})),
            ),
        });
        let view = app.stats.view(StatsSeries::Caffeine).unwrap();
        assert!(!view.loading);
        assert_eq!(view.lines, vec!["total: 320".to_string()]);
        assert!(app.stats.view(StatsSeries::Sleep).unwrap().loading);
    }

    #[test]
    fn logout_resets_session_and_aborts_requests() {
        let mut app = signed_in();
        app.refresh_home();
        app.take_requests();
        app.logout();
        assert_eq!(app.screen(), Screen::Login);
        let (aborts, outbox) = app.take_requests();
        assert_eq!(aborts.len(), 2);
        assert!(outbox.is_empty());
        assert!(app.flow.auth().is_none());
    }
}
