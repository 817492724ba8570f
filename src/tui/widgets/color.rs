use ratatui::style::{Color, Modifier, Style};
use crate::Config;

/// Parse a theme color string into a ratatui Color.
///
/// Accepts the basic and light named colors, `#RRGGBB`, `#RGB` and
/// `rgb(r, g, b)`. Anything else renders as white.
pub fn parse_color(color_str: &str) -> Color {
    let s = color_str.trim().to_lowercase();

    match s.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "lightgray" | "lightgrey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        _ => {
            let parsed = if s.starts_with('#') {
                parse_hex_color(&s)
            } else if s.starts_with("rgb(") {
                parse_rgb_color(&s)
            } else {
                None
            };
            parsed.unwrap_or(Color::White)
        }
    }
}

fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim_start_matches('#');
    match hex.len() {
        6 => Some(Color::Rgb(
            u8::from_str_radix(hex.get(0..2)?, 16).ok()?,
            u8::from_str_radix(hex.get(2..4)?, 16).ok()?,
            u8::from_str_radix(hex.get(4..6)?, 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| -> Option<u8> {
                let v = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
                Some((v << 4) | v)
            };
            Some(Color::Rgb(digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

fn parse_rgb_color(s: &str) -> Option<Color> {
    let content = s.strip_prefix("rgb(")?.strip_suffix(')')?;
    let parts: Vec<u8> = content
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [r, g, b] => Some(Color::Rgb(*r, *g, *b)),
        _ => None,
    }
}

/// Format a Color back to the string form used in config files
pub fn format_color_for_display(color: &Color) -> String {
    match color {
        Color::Black => "black".to_string(),
        Color::Red => "red".to_string(),
        Color::Green => "green".to_string(),
        Color::Yellow => "yellow".to_string(),
        Color::Blue => "blue".to_string(),
        Color::Magenta => "magenta".to_string(),
        Color::Cyan => "cyan".to_string(),
        Color::White => "white".to_string(),
        Color::Gray => "gray".to_string(),
        Color::DarkGray => "darkgray".to_string(),
        Color::LightRed => "lightred".to_string(),
        Color::LightGreen => "lightgreen".to_string(),
        Color::LightYellow => "lightyellow".to_string(),
        Color::LightBlue => "lightblue".to_string(),
        Color::LightMagenta => "lightmagenta".to_string(),
        Color::LightCyan => "lightcyan".to_string(),
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Indexed(_) => "indexed".to_string(),
        Color::Reset => "reset".to_string(),
    }
}

/// WCAG relative luminance of an RGB color, 0.0 (dark) to 1.0 (light)
fn calculate_luminance(r: u8, g: u8, b: u8) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Black or white text, whichever reads better on `background`.
/// Gray renders light in most terminals, so it gets black text.
pub fn get_contrast_text_color(background: Color) -> Color {
    let dark = match background {
        Color::Rgb(r, g, b) => calculate_luminance(r, g, b) < 0.5,
        other => matches!(other, Color::Black | Color::Blue | Color::Magenta | Color::Red),
    };
    if dark { Color::White } else { Color::Black }
}

/// Resolved colors of the active theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub tab_bg: Color,
}

impl Palette {
    pub fn from_config(config: &Config) -> Self {
        let theme = config.get_active_theme();
        Self {
            fg: parse_color(&theme.fg),
            bg: parse_color(&theme.bg),
            highlight_bg: parse_color(&theme.highlight_bg),
            highlight_fg: parse_color(&theme.highlight_fg),
            tab_bg: parse_color(&theme.tab_bg),
        }
    }

    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(Color::DarkGray).bg(self.bg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_hex_and_rgb() {
        assert_eq!(parse_color("LightBlue"), Color::LightBlue);
        assert_eq!(parse_color("#3b3b98"), Color::Rgb(0x3b, 0x3b, 0x98));
        assert_eq!(parse_color("#fff"), Color::Rgb(255, 255, 255));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Color::Rgb(1, 2, 3));
    }

    #[test]
    fn unknown_colors_fall_back_to_white() {
        assert_eq!(parse_color("chartreuse"), Color::White);
        assert_eq!(parse_color("#12345"), Color::White);
        assert_eq!(parse_color("rgb(1,2)"), Color::White);
        assert_eq!(parse_color("#zzzzzz"), Color::White);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for color in [Color::DarkGray, Color::Rgb(10, 200, 30), Color::LightCyan] {
            assert_eq!(parse_color(&format_color_for_display(&color)), color);
        }
    }

    #[test]
    fn contrast_picks_readable_text() {
        assert_eq!(get_contrast_text_color(Color::Blue), Color::White);
        assert_eq!(get_contrast_text_color(Color::Gray), Color::Black);
        assert_eq!(get_contrast_text_color(Color::Rgb(0x3b, 0x3b, 0x98)), Color::White);
        assert_eq!(get_contrast_text_color(Color::Rgb(250, 250, 210)), Color::Black);
    }
}
