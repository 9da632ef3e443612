//! Console tracing for the container lifecycles.
//!
//! A `Tracer` is a plain value handed to whatever should report its
//! lifecycle. It replaces process-wide logging macros: two objects can trace
//! to different sinks, and tests read lines back from a capture sink.

use colored::Colorize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{TraceConfig, TraceTarget};

#[derive(Debug, Clone, Default)]
enum Sink {
    #[default]
    Off,
    Stdout,
    Stderr,
    Capture(Arc<Mutex<Vec<String>>>),
}

#[derive(Debug, Clone, Default)]
pub struct Tracer {
    sink: Sink,
    color: bool,
}

impl Tracer {
    /// A tracer that discards everything.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn stdout() -> Self {
        Self {
            sink: Sink::Stdout,
            color: true,
        }
    }

    /// Collects uncolored lines in memory; read them back with [`Tracer::lines`].
    pub fn capture() -> Self {
        Self {
            sink: Sink::Capture(Arc::new(Mutex::new(Vec::new()))),
            color: false,
        }
    }

    pub fn from_config(config: &TraceConfig) -> Self {
        if !config.enabled {
            return Self::silent();
        }
        let sink = match config.target {
            TraceTarget::Stdout => Sink::Stdout,
            TraceTarget::Stderr => Sink::Stderr,
        };
        Self {
            sink,
            color: config.color,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.sink, Sink::Off)
    }

    /// Lines recorded so far by a capture tracer. Empty for any other sink.
    pub fn lines(&self) -> Vec<String> {
        match &self.sink {
            Sink::Capture(lines) => lines.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            _ => Vec::new(),
        }
    }

    /// One lifecycle line: `label: action detail`.
    pub fn event(&self, label: &str, action: &str, detail: fmt::Arguments<'_>) {
        if !self.is_enabled() {
            return;
        }
        let detail = detail.to_string();
        let plain = join_event(label, action, &detail);
        self.write(plain, || {
            let label = if label.is_empty() {
                String::new()
            } else {
                format!("{}: ", label.cyan())
            };
            let action = action.bold().to_string();
            if detail.is_empty() {
                format!("{label}{action}")
            } else {
                format!("{label}{action} {detail}")
            }
        });
    }

    /// An unadorned line.
    pub fn info(&self, text: &str) {
        self.write(text.to_string(), || text.to_string());
    }

    /// A section heading, preceded by a blank line on the console.
    pub fn doc(&self, text: &str) {
        self.write(text.to_string(), || format!("\n{}", text.red().bold().underline()));
    }

    pub fn success(&self, text: &str) {
        let plain = format!("SUCCESS: {text}");
        self.write(plain.clone(), || plain.magenta().to_string());
    }

    pub fn failed(&self, text: &str) {
        let plain = format!("FAILED: {text}");
        self.write(plain.clone(), || plain.blue().to_string());
    }

    fn write(&self, plain: String, styled: impl FnOnce() -> String) {
        match &self.sink {
            Sink::Off => {}
            Sink::Stdout => println!("{}", self.render(plain, styled)),
            Sink::Stderr => eprintln!("{}", self.render(plain, styled)),
            Sink::Capture(lines) => lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(plain),
        }
    }

    fn render(&self, plain: String, styled: impl FnOnce() -> String) -> String {
        if self.color {
            styled()
        } else {
            plain
        }
    }
}

fn join_event(label: &str, action: &str, detail: &str) -> String {
    let mut line = String::new();
    if !label.is_empty() {
        line.push_str(label);
        line.push_str(": ");
    }
    line.push_str(action);
    if !detail.is_empty() {
        line.push(' ');
        line.push_str(detail);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_tracer_records_nothing() {
        let tracer = Tracer::silent();
        tracer.event("x", "new", format_args!("{}", 1));
        tracer.doc("heading");
        assert!(!tracer.is_enabled());
        assert!(tracer.lines().is_empty());
    }

    #[test]
    fn capture_formats_events() {
        let tracer = Tracer::capture();
        tracer.event("[foo1]", "make_shared", format_args!("count={}", 1));
        tracer.event("", "delete", format_args!(""));
        tracer.event("vec1", "push", format_args!(""));

        assert_eq!(
            tracer.lines(),
            vec!["[foo1]: make_shared count=1", "delete", "vec1: push"]
        );
    }

    #[test]
    fn clones_share_the_capture() {
        let tracer = Tracer::capture();
        let other = tracer.clone();
        other.success("copied");
        tracer.failed("moved");
        tracer.doc("End");
        other.info("vec1: [10][11]");

        assert_eq!(
            tracer.lines(),
            vec!["SUCCESS: copied", "FAILED: moved", "End", "vec1: [10][11]"]
        );
        assert_eq!(other.lines().len(), 4);
    }

    #[test]
    fn disabled_config_gives_silent_tracer() {
        let config = TraceConfig {
            enabled: false,
            ..TraceConfig::default()
        };
        assert!(!Tracer::from_config(&config).is_enabled());
        assert!(Tracer::from_config(&TraceConfig::default()).is_enabled());
    }

    #[test]
    fn render_respects_color_flag() {
        let mut tracer = Tracer::stdout();
        tracer.color = false;
        assert_eq!(tracer.render("plain".into(), || "styled".into()), "plain");
        tracer.color = true;
        assert_eq!(tracer.render("plain".into(), || "styled".into()), "styled");
    }
}
