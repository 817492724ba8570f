use ratatui::widgets::Paragraph;
use ratatui::Frame;
use ratatui::layout::Rect;
use crate::Config;
use crate::tui::widgets::color::Palette;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Join as many hints as fit in `max_width` columns, ending with an
/// ellipsis when some had to be dropped.
pub fn fit_hints(key_hints: &[String], max_width: usize) -> String {
    let mut hints_text = String::new();
    for (i, hint) in key_hints.iter().enumerate() {
        let current_len = hints_text.chars().count();
        let would_be_len = if i == 0 {
            hint.chars().count()
        } else {
            current_len + SEPARATOR.chars().count() + hint.chars().count()
        };

        if would_be_len > max_width {
            let source = if i == 0 { hint.as_str() } else { hints_text.as_str() };
            let keep = if i > 0 && current_len + ELLIPSIS.len() <= max_width {
                current_len
            } else {
                max_width.saturating_sub(ELLIPSIS.len())
            };
            let mut truncated: String = source.chars().take(keep).collect();
            truncated.push_str(ELLIPSIS);
            return truncated;
        }

        if i > 0 {
            hints_text.push_str(SEPARATOR);
        }
        hints_text.push_str(hint);
    }
    hints_text
}

fn truncate_message(message: &str, max_width: usize) -> String {
    if message.chars().count() > max_width {
        let mut truncated: String = message.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    } else {
        message.to_string()
    }
}

/// One-line footer: the status message when present, key hints otherwise
pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&str>,
    key_hints: &[String],
    config: &Config,
) {
    let palette = Palette::from_config(config);
    let max_width = area.width as usize;

    let (content, style) = match message {
        Some(msg) => (truncate_message(msg, max_width), palette.selected()),
        None => (fit_hints(key_hints, max_width), palette.normal()),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["q: Quit".to_string(), "n: New".to_string(), "F1: Help".to_string()]
    }

    #[test]
    fn all_hints_fit() {
        assert_eq!(fit_hints(&hints(), 80), "q: Quit • n: New • F1: Help");
    }

    #[test]
    fn overflow_ends_with_ellipsis() {
        let text = fit_hints(&hints(), 19);
        assert_eq!(text, "q: Quit • n: New...");
        assert_eq!(fit_hints(&hints(), 18), "q: Quit • n: Ne...");
    }

    #[test]
    fn single_long_hint_is_cut() {
        let text = fit_hints(&["Ctrl+s: Save entry".to_string()], 10);
        assert_eq!(text, "Ctrl+s:...");
    }

    #[test]
    fn long_message_is_cut() {
        assert_eq!(truncate_message("Failed to save. Try again.", 10), "Failed ...");
        assert_eq!(truncate_message("Saved", 10), "Saved");
    }
}
