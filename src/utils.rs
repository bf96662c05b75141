use crossterm::event::{KeyCode, KeyModifiers};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Which set of directories the app uses, selected by `--dev`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    pub fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "chorely-dev",
            Profile::Prod => "chorely",
        }
    }
}

fn project_dirs(profile: Profile) -> Option<ProjectDirs> {
    ProjectDirs::from("com", "chorely", profile.app_name())
}

pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Holds the database and the log files
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<chrono::NaiveDate, chrono::ParseError> {
    chrono::NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeyBinding {
    pub key_code: KeyCode,
    pub requires_ctrl: bool,
}

impl ParsedKeyBinding {
    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.key_code == code && self.requires_ctrl == has_primary_modifier(modifiers)
    }
}

/// Ctrl everywhere; Option/Alt also counts on macOS
pub fn has_primary_modifier(modifiers: KeyModifiers) -> bool {
    #[cfg(target_os = "macos")]
    {
        modifiers.contains(KeyModifiers::CONTROL) || modifiers.contains(KeyModifiers::ALT)
    }

    #[cfg(not(target_os = "macos"))]
    {
        modifiers.contains(KeyModifiers::CONTROL)
    }
}

/// Key binding as shown in hints; "Ctrl+" reads "Opt+" on macOS
pub fn format_key_binding_for_display(key_binding: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        key_binding.replace("Ctrl+", "Opt+")
    }

    #[cfg(not(target_os = "macos"))]
    {
        key_binding.to_string()
    }
}

/// Parse a binding from config: a single character ("q", "+"), a named key
/// ("Enter", "Left", "F1", "Space") or either behind "Ctrl+"
pub fn parse_key_binding(key_str: &str) -> Result<ParsedKeyBinding, String> {
    let key_str = key_str.trim();
    match key_str.strip_prefix("Ctrl+") {
        Some(key_part) => Ok(ParsedKeyBinding {
            key_code: parse_key_code(key_part)?,
            requires_ctrl: true,
        }),
        None => Ok(ParsedKeyBinding {
            key_code: parse_key_code(key_str)?,
            requires_ctrl: false,
        }),
    }
}

fn parse_key_code(key_str: &str) -> Result<KeyCode, String> {
    let code = match key_str {
        "Enter" => KeyCode::Enter,
        "Esc" | "Escape" => KeyCode::Esc,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Space" | " " => KeyCode::Char(' '),
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Delete" => KeyCode::Delete,
        _ => {
            if let Some(n) = key_str.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                if (1..=12).contains(&n) {
                    return Ok(KeyCode::F(n));
                }
            }
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return Err(format!("Unknown key binding: {}", key_str)),
            }
        }
    };
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_binding() {
        assert_eq!(
            parse_key_binding("q").unwrap(),
            ParsedKeyBinding { key_code: KeyCode::Char('q'), requires_ctrl: false }
        );
        assert_eq!(parse_key_binding("Space").unwrap().key_code, KeyCode::Char(' '));
        assert_eq!(parse_key_binding("F1").unwrap().key_code, KeyCode::F(1));
        assert_eq!(parse_key_binding("+").unwrap().key_code, KeyCode::Char('+'));

        let ctrl = parse_key_binding("Ctrl+r").unwrap();
        assert!(ctrl.requires_ctrl);
        assert_eq!(ctrl.key_code, KeyCode::Char('r'));

        assert!(parse_key_binding("Hyper").is_err());
        assert!(parse_key_binding("F13").is_err());
        assert!(parse_key_binding("").is_err());
    }

    #[test]
    fn test_binding_matches_modifiers() {
        let plain = parse_key_binding("r").unwrap();
        assert!(plain.matches(KeyCode::Char('r'), KeyModifiers::NONE));
        assert!(!plain.matches(KeyCode::Char('r'), KeyModifiers::CONTROL));

        let ctrl = parse_key_binding("Ctrl+r").unwrap();
        assert!(ctrl.matches(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert!(!ctrl.matches(KeyCode::Char('r'), KeyModifiers::NONE));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2026-02-15 ").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
        );
        assert!(parse_date("15/02/2026").is_err());
    }

    #[test]
    fn test_expand_path_leaves_absolute_paths() {
        assert_eq!(expand_path("/tmp/chores.db"), PathBuf::from("/tmp/chores.db"));
    }
}
