//! Output formatting: JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Structured formats
//! use serde; plain emits one human-readable summary line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use refetch_core::RequestState;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// `plain_fn` produces the `plain` rendering.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Render a request state; YAML states are separated as documents so a
/// stream of them stays parseable.
pub fn render_state(
    format: &OutputFormat,
    state: &RequestState,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Yaml => Ok(format!("---\n{}", render_yaml(state)?.trim_end())),
        other => render_single(other, state, |s| state_line(s, color)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
    let _ = stdout.flush();
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

/// `<phase> <status> <key> <time> <data>` on one line.
pub fn state_line(state: &RequestState, color: bool) -> String {
    let phase = phase_label(state);
    let phase = if color {
        paint_phase(phase, state)
    } else {
        phase.to_owned()
    };

    let status = state
        .status
        .map_or_else(|| "---".to_owned(), |s| s.to_string());
    let time = state
        .response_time
        .map_or_else(|| "-".to_owned(), |ms| format!("{ms}ms"));
    let data = state
        .data
        .as_ref()
        .map_or_else(|| "null".to_owned(), ToString::to_string);
    let key = if color {
        state.key.to_string().dimmed().to_string()
    } else {
        state.key.to_string()
    };

    format!("{phase} {status} {key} {time} {data}")
}

fn paint_phase(phase: &str, state: &RequestState) -> String {
    if state.error {
        phase.red().bold().to_string()
    } else if state.success {
        phase.green().to_string()
    } else {
        phase.yellow().to_string()
    }
}

fn phase_label(state: &RequestState) -> &'static str {
    if state.revalidating {
        "revalidating"
    } else if state.loading {
        "loading"
    } else if state.error {
        "error"
    } else if state.success {
        "ok"
    } else {
        "idle"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use refetch_core::{RequestConfig, resolve_key};
    use serde_json::json;

    use super::*;

    fn settled() -> RequestState {
        RequestState {
            data: Some(json!({"id": 1})),
            loading: false,
            revalidating: false,
            error: false,
            success: true,
            status: Some(200),
            start: None,
            end: None,
            response_time: Some(12),
            key: resolve_key("/users", &RequestConfig::new()),
        }
    }

    #[test]
    fn plain_line_summarizes_state() {
        let line = state_line(&settled(), false);
        assert_eq!(line, r#"ok 200 GET /users 12ms {"id":1}"#);
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_state(&OutputFormat::JsonCompact, &settled(), false).unwrap();
        assert!(!out.contains('\n'));
        assert!(out.contains(r#""responseTime":12"#));
    }

    #[test]
    fn yaml_states_are_separate_documents() {
        let out = render_state(&OutputFormat::Yaml, &settled(), false).unwrap();
        assert!(out.starts_with("---\n"));
        assert!(out.contains("status: 200"));
    }
}
