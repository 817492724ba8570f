//! Screen-flow state machine: which screen is visible, the capture draft's
//! intake time, the signed-in user and the session's logged entries.

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{AuthParams, CaffeineEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainTab {
    Home,
    Stats,
    My,
}

impl MainTab {
    pub const ALL: [MainTab; 3] = [MainTab::Home, MainTab::Stats, MainTab::My];

    pub fn title(self) -> &'static str {
        match self {
            MainTab::Home => "Home",
            MainTab::Stats => "Stats",
            MainTab::My => "My",
        }
    }

    pub fn index(self) -> usize {
        match self {
            MainTab::Home => 0,
            MainTab::Stats => 1,
            MainTab::My => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Main(MainTab),
    TimeSelection,
    BeverageSelection,
}

#[derive(Debug, Clone)]
pub enum FlowEvent {
    Authenticated(AuthParams),
    SelectTab(MainTab),
    NewEntry,
    TimeChosen(DateTime<Local>),
    Cancel,
    Saved(CaffeineEntry),
    Logout,
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            FlowEvent::Authenticated(_) => "authenticate",
            FlowEvent::SelectTab(_) => "select tab",
            FlowEvent::NewEntry => "new entry",
            FlowEvent::TimeChosen(_) => "choose time",
            FlowEvent::Cancel => "cancel",
            FlowEvent::Saved(_) => "save",
            FlowEvent::Logout => "logout",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("cannot {event} on the {screen:?} screen")]
    InvalidTransition { screen: Screen, event: &'static str },
}

#[derive(Debug, Clone)]
pub struct Flow {
    screen: Screen,
    last_tab: MainTab,
    intake_time: Option<DateTime<Local>>,
    auth: Option<AuthParams>,
    entries: Vec<CaffeineEntry>,
}

impl Default for Flow {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            last_tab: MainTab::Home,
            intake_time: None,
            auth: None,
            entries: Vec::new(),
        }
    }
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The main tab shown now, or the one to return to from the capture flow
    pub fn active_tab(&self) -> MainTab {
        self.last_tab
    }

    pub fn intake_time(&self) -> Option<DateTime<Local>> {
        self.intake_time
    }

    pub fn auth(&self) -> Option<&AuthParams> {
        self.auth.as_ref()
    }

    pub fn entries(&self) -> &[CaffeineEntry] {
        &self.entries
    }

    /// Sum of known amounts; entries without an amount count as zero
    pub fn total_mg(&self) -> u32 {
        self.entries.iter().filter_map(|e| e.mg).sum()
    }

    /// Apply one event. Invalid (screen, event) pairs leave state untouched.
    pub fn apply(&mut self, event: FlowEvent) -> Result<(), FlowError> {
        let from = self.screen;
        match (from, event) {
            (Screen::Login, FlowEvent::Authenticated(auth)) => {
                info!(user = %auth.user_id, "signed in");
                self.auth = Some(auth);
                self.last_tab = MainTab::Home;
                self.screen = Screen::Main(MainTab::Home);
            }
            (Screen::Main(_), FlowEvent::SelectTab(tab)) => {
                self.last_tab = tab;
                self.screen = Screen::Main(tab);
            }
            (Screen::Main(_), FlowEvent::NewEntry) => {
                self.intake_time = None;
                self.screen = Screen::TimeSelection;
            }
            (Screen::Main(_), FlowEvent::Logout) => {
                info!("signed out");
                self.auth = None;
                self.entries.clear();
                self.intake_time = None;
                self.last_tab = MainTab::Home;
                self.screen = Screen::Login;
            }
            (Screen::TimeSelection, FlowEvent::Cancel) => {
                self.intake_time = None;
                self.screen = Screen::Main(self.last_tab);
            }
            (Screen::TimeSelection, FlowEvent::TimeChosen(time)) => {
                self.intake_time = Some(time);
                self.screen = Screen::BeverageSelection;
            }
            (Screen::BeverageSelection, FlowEvent::Cancel) => {
                self.screen = Screen::TimeSelection;
            }
            (Screen::BeverageSelection, FlowEvent::Saved(entry)) => {
                info!(entry = %entry.beverage, "entry logged");
                self.entries.push(entry);
                self.intake_time = None;
                self.last_tab = MainTab::Home;
                self.screen = Screen::Main(MainTab::Home);
            }
            (screen, event) => {
                return Err(FlowError::InvalidTransition {
                    screen,
                    event: event.name(),
                });
            }
        }
        debug!(from = ?from, to = ?self.screen, "screen transition");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn auth() -> AuthParams {
        AuthParams {
            user_id: "user-1".to_string(),
            token: None,
        }
    }

    fn entry(mg: Option<u32>) -> CaffeineEntry {
        CaffeineEntry {
            id: Uuid::new_v4(),
            beverage: "아메리카노 (Tall)".to_string(),
            category: "커피".to_string(),
            time: Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            mg,
            store_name: "스타벅스".to_string(),
            size: "Tall".to_string(),
        }
    }

    fn signed_in() -> Flow {
        let mut flow = Flow::new();
        flow.apply(FlowEvent::Authenticated(auth())).unwrap();
        flow
    }

    #[test]
    fn starts_at_login() {
        let flow = Flow::new();
        assert_eq!(flow.screen(), Screen::Login);
        assert!(flow.auth().is_none());
    }

    #[test]
    fn login_reaches_home_and_keeps_auth() {
        let flow = signed_in();
        assert_eq!(flow.screen(), Screen::Main(MainTab::Home));
        assert_eq!(flow.auth(), Some(&auth()));
    }

    #[test]
    fn only_authentication_leaves_login() {
        let mut flow = Flow::new();
        for event in [FlowEvent::NewEntry, FlowEvent::Cancel, FlowEvent::SelectTab(MainTab::Stats)] {
            assert!(flow.apply(event).is_err());
            assert_eq!(flow.screen(), Screen::Login);
        }
    }

    #[test]
    fn full_capture_round_trip() {
        let mut flow = signed_in();
        flow.apply(FlowEvent::NewEntry).unwrap();
        assert_eq!(flow.screen(), Screen::TimeSelection);

        let time = Local.with_ymd_and_hms(2024, 5, 1, 8, 15, 0).unwrap();
        flow.apply(FlowEvent::TimeChosen(time)).unwrap();
        assert_eq!(flow.screen(), Screen::BeverageSelection);
        assert_eq!(flow.intake_time(), Some(time));

        flow.apply(FlowEvent::Cancel).unwrap();
        assert_eq!(flow.screen(), Screen::TimeSelection);
        assert_eq!(flow.intake_time(), Some(time), "back keeps the chosen time");

        flow.apply(FlowEvent::TimeChosen(time)).unwrap();
        flow.apply(FlowEvent::Saved(entry(None))).unwrap();
        assert_eq!(flow.screen(), Screen::Main(MainTab::Home));
        assert_eq!(flow.entries().len(), 1);
        assert!(flow.intake_time().is_none());
    }

    #[test]
    fn cancelling_time_returns_to_previous_tab() {
        let mut flow = signed_in();
        flow.apply(FlowEvent::SelectTab(MainTab::Stats)).unwrap();
        flow.apply(FlowEvent::NewEntry).unwrap();
        flow.apply(FlowEvent::Cancel).unwrap();
        assert_eq!(flow.screen(), Screen::Main(MainTab::Stats));
        assert!(flow.intake_time().is_none());
    }

    #[test]
    fn saving_outside_beverage_step_is_rejected() {
        let mut flow = signed_in();
        let err = flow.apply(FlowEvent::Saved(entry(None))).unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidTransition {
                screen: Screen::Main(MainTab::Home),
                event: "save",
            }
        );
        assert!(flow.entries().is_empty());
    }

    #[test]
    fn logout_clears_session() {
        let mut flow = signed_in();
        flow.apply(FlowEvent::NewEntry).unwrap();
        flow.apply(FlowEvent::TimeChosen(Local::now())).unwrap();
        flow.apply(FlowEvent::Saved(entry(Some(80)))).unwrap();
        flow.apply(FlowEvent::Logout).unwrap();
        assert_eq!(flow.screen(), Screen::Login);
        assert!(flow.entries().is_empty());
        assert!(flow.auth().is_none());
    }

    #[test]
    fn total_mg_ignores_unknown_amounts() {
        let mut flow = signed_in();
        for mg in [Some(150), None, Some(30)] {
            flow.apply(FlowEvent::NewEntry).unwrap();
            flow.apply(FlowEvent::TimeChosen(Local::now())).unwrap();
            flow.apply(FlowEvent::Saved(entry(mg))).unwrap();
        }
        assert_eq!(flow.total_mg(), 180);
    }

    #[test]
    fn tabs_cycle() {
        assert_eq!(MainTab::My.next(), MainTab::Home);
        assert_eq!(MainTab::Home.previous(), MainTab::My);
    }
}
