use clap::ValueEnum;
use comfy_table::{modifiers, presets, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

/// Status line kinds; serialized as the `type` of a JSON notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    /// Errors still print under `--quiet`
    fn survives_quiet(self) -> bool {
        self == NoticeKind::Error
    }

    fn goes_to_stderr(self) -> bool {
        matches!(self, NoticeKind::Warning | NoticeKind::Error)
    }
}

/// `{"type": "warning", "message": "..."}`
#[derive(Debug, Serialize)]
struct Notice<'a> {
    #[serde(rename = "type")]
    kind: NoticeKind,
    message: &'a str,
}

fn human_line(kind: NoticeKind, message: &str) -> String {
    match kind {
        NoticeKind::Success => format!("{} {}", "✓".green(), message),
        NoticeKind::Info => message.to_string(),
        NoticeKind::Warning => format!("{} {}", "⚠".yellow(), message),
        NoticeKind::Error => format!("{} {}", "✗".red(), message),
    }
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.notice(NoticeKind::Success, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.notice(NoticeKind::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.notice(NoticeKind::Warning, msg.as_ref());
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.notice(NoticeKind::Error, msg.as_ref());
    }

    fn notice(&self, kind: NoticeKind, message: &str) {
        if self.quiet && !kind.survives_quiet() {
            return;
        }

        if self.is_human() {
            let line = human_line(kind, message);
            if kind.goes_to_stderr() {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        } else {
            self.print_json(&Notice { kind, message });
        }
    }

    /// Human-mode heading; JSON modes skip it
    pub fn heading(&self, title: impl AsRef<str>) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("\n{}", title.as_ref().bright_cyan().bold());
    }

    /// Human-mode table; JSON modes print their own payload instead
    pub fn table(&self, table: &Table) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("{}", table);
    }

    /// Command payload for the JSON formats
    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && !self.is_human() {
            return;
        }
        self.print_json(data);
    }

    fn print_json<T: Serialize>(&self, data: &T) {
        let rendered = match self.format {
            OutputFormat::JsonPretty => serde_json::to_string_pretty(data),
            OutputFormat::Json | OutputFormat::Human => serde_json::to_string(data),
        };
        match rendered {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("Could not render JSON output: {}", e),
        }
    }
}

/// Table with the rounded UTF-8 look used throughout the CLI
pub fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_envelope() {
        let notice = Notice {
            kind: NoticeKind::Warning,
            message: "Watchlist not saved",
        };
        let value = serde_json::to_value(&notice).unwrap();
        assert_eq!(value, serde_json::json!({"type": "warning", "message": "Watchlist not saved"}));
    }

    #[test]
    fn test_only_errors_survive_quiet() {
        assert!(NoticeKind::Error.survives_quiet());
        assert!(!NoticeKind::Warning.survives_quiet());
        assert!(!NoticeKind::Success.survives_quiet());
    }

    #[test]
    fn test_human_line_keeps_message() {
        assert_eq!(human_line(NoticeKind::Info, "Watchlist is empty"), "Watchlist is empty");
        assert!(human_line(NoticeKind::Success, "Added").ends_with(" Added"));
    }
}
