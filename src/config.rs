use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL; when absent the environment is consulted
    #[serde(default)]
    pub api_url: Option<String>,
    /// Bearer token replayed on every request after login
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Pre-filled on the login screen
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new_entry")]
    pub new_entry: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_tab_left")]
    pub tab_left: String,
    #[serde(default = "default_tab_right")]
    pub tab_right: String,
    #[serde(default = "default_tab_1")]
    pub tab_1: String,
    #[serde(default = "default_tab_2")]
    pub tab_2: String,
    #[serde(default = "default_tab_3")]
    pub tab_3: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_previous_day")]
    pub previous_day: String,
    #[serde(default = "default_next_day")]
    pub next_day: String,
    #[serde(default = "default_edit_goal")]
    pub edit_goal: String,
    #[serde(default = "default_record_sleep")]
    pub record_sleep: String,
    #[serde(default = "default_cycle_theme")]
    pub cycle_theme: String,
    #[serde(default = "default_logout")]
    pub logout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_tab_bg")]
    pub tab_bg: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut themes = HashMap::new();

        // Example custom theme so users can see the format
        themes.insert("night".to_string(), Theme {
            fg: "lightblue".to_string(),
            bg: "black".to_string(),
            highlight_bg: "#3b3b98".to_string(),
            highlight_fg: "white".to_string(),
            tab_bg: "darkgray".to_string(),
        });

        Self {
            api_url: None,
            auth_token: None,
            user_id: None,
            log_filter: default_log_filter(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes,
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new_entry: default_new_entry(),
            save: default_save(),
            select: default_select(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            tab_left: default_tab_left(),
            tab_right: default_tab_right(),
            tab_1: default_tab_1(),
            tab_2: default_tab_2(),
            tab_3: default_tab_3(),
            help: default_help(),
            refresh: default_refresh(),
            previous_day: default_previous_day(),
            next_day: default_next_day(),
            edit_goal: default_edit_goal(),
            record_sleep: default_record_sleep(),
            cycle_theme: default_cycle_theme(),
            logout: default_logout(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            tab_bg: default_tab_bg(),
        }
    }
}

impl Theme {
    /// Get preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            highlight_bg: "blue".to_string(),
            highlight_fg: "white".to_string(),
            tab_bg: "gray".to_string(),
        });

        themes.insert("monochrome".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "white".to_string(),
            highlight_fg: "black".to_string(),
            tab_bg: "gray".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_log_filter() -> String {
    "info".to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new_entry() -> String {
    "n".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_select() -> String {
    "Enter".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_tab_left() -> String {
    "Left".to_string()
}

fn default_tab_right() -> String {
    "Right".to_string()
}

fn default_tab_1() -> String {
    "1".to_string()
}

fn default_tab_2() -> String {
    "2".to_string()
}

fn default_tab_3() -> String {
    "3".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_refresh() -> String {
    "r".to_string()
}

fn default_previous_day() -> String {
    "[".to_string()
}

fn default_next_day() -> String {
    "]".to_string()
}

fn default_edit_goal() -> String {
    "g".to_string()
}

fn default_record_sleep() -> String {
    "s".to_string()
}

fn default_cycle_theme() -> String {
    "t".to_string()
}

fn default_logout() -> String {
    "Ctrl+l".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_tab_bg() -> String {
    "gray".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Theme not found: {0}")]
    ThemeNotFound(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path)
    }

    /// Load from an explicit path, writing defaults there when missing
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            if config.config_version != Some(CURRENT_CONFIG_VERSION) {
                warn!(version = ?config.config_version, "config written by a different version");
            }
            Ok(config)
        } else {
            let mut config = Config::default();
            config.save_to_path(config_path)?;
            info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Save configuration to the profile's config file
    pub fn save_with_profile(&mut self, profile: utils::Profile) -> Result<(), ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the currently active theme, falling back to the default preset
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = self
            .themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().get(&self.current_theme).cloned())
            .unwrap_or_default();

        // An empty highlight_fg is derived from highlight_bg
        if theme.highlight_fg.is_empty() {
            let calculated_fg = get_contrast_text_color(parse_color(&theme.highlight_bg));
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }

        theme
    }

    /// Set the active theme by name
    pub fn set_theme(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.themes.contains_key(name) && !Theme::get_preset_themes().contains_key(name) {
            return Err(ConfigError::ThemeNotFound(name.to_string()));
        }

        self.current_theme = name.to_string();
        Ok(())
    }

    /// Get all available theme names (presets + user-defined), sorted
    pub fn get_available_themes(&self) -> Vec<String> {
        let presets = Theme::get_preset_themes();
        let mut themes: Vec<String> = presets.keys().cloned().collect();

        for theme_name in self.themes.keys() {
            if !presets.contains_key(theme_name) {
                themes.push(theme_name.clone());
            }
        }

        themes.sort();
        themes
    }

    /// Name of the theme after the current one, wrapping
    pub fn next_theme_name(&self) -> String {
        let themes = self.get_available_themes();
        let idx = themes
            .iter()
            .position(|t| t == &self.current_theme)
            .map(|i| (i + 1) % themes.len())
            .unwrap_or(0);
        themes
            .get(idx)
            .cloned()
            .unwrap_or_else(default_current_theme)
    }
}
