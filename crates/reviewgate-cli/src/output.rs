use clap::ValueEnum;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Success,
    Info,
    Warning,
    Error,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Kind::Success => "success",
            Kind::Info => "info",
            Kind::Warning => "warning",
            Kind::Error => "error",
        }
    }
}

/// User-facing output; logs go through tracing instead
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format != OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message(Kind::Success, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message(Kind::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message(Kind::Warning, msg.as_ref());
    }

    /// Shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        self.message(Kind::Error, msg.as_ref());
    }

    /// Plain text in human mode; nothing in JSON modes
    pub fn println(&self, msg: impl AsRef<str>) {
        if !self.quiet && !self.is_json() {
            println!("{}", msg.as_ref());
        }
    }

    /// Structured result: printed as-is in JSON modes, as `human` otherwise
    pub fn result(&self, data: &Value, human: impl FnOnce()) {
        if self.quiet {
            return;
        }
        if self.is_json() {
            self.print_json(data);
        } else {
            human();
        }
    }

    pub fn table(&self, table: &Table) {
        if !self.quiet {
            println!("{}", table);
        }
    }

    fn message(&self, kind: Kind, msg: &str) {
        if self.quiet && !matches!(kind, Kind::Error) {
            return;
        }
        match self.format {
            OutputFormat::Human => match kind {
                Kind::Success => println!("{} {}", "✓".green(), msg),
                Kind::Info => println!("{}", msg),
                Kind::Warning => println!("{} {}", "⚠".yellow(), msg),
                Kind::Error => eprintln!("{} {}", "✗".red(), msg),
            },
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": kind.as_str(), "message": msg }));
            }
        }
    }

    fn print_json(&self, data: &Value) {
        let rendered = match self.format {
            OutputFormat::JsonPretty => serde_json::to_string_pretty(data),
            _ => serde_json::to_string(data),
        };
        println!("{}", rendered.unwrap_or_default());
    }
}
