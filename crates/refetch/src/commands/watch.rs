//! `refetch watch` -- keep a resource fresh and stream its states.
//!
//! Each line on stdin is treated as the application becoming visible
//! again (a focus signal); a line reading `reconnect` signals restored
//! connectivity instead. Ctrl-C stops the watch.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use refetch_core::{RequestConfig, RequestState, Revalidator};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: &WatchArgs,
    revalidator: &Revalidator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let config = trigger_config(args, util::request_config(&args.request)?);
    let resource = revalidator.open(&args.request.url, config).await?;
    let mut states = resource.subscribe();
    let watcher = resource.watch();
    info!(key = %resource.key(), "watching");

    let printer = Printer::new(global);
    printer.emit(states.current())?;
    let mut printed = 1_u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    while args.count.is_none_or(|limit| printed < limit) {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
            changed = states.changed() => match changed {
                Some(state) => {
                    printer.emit(&state)?;
                    printed += 1;
                }
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().eq_ignore_ascii_case("reconnect") => {
                    let listeners = revalidator.notify_reconnect();
                    debug!(listeners, "reconnect signal");
                }
                Ok(Some(_)) => {
                    let listeners = revalidator.notify_focus();
                    debug!(listeners, "focus signal");
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    watcher.stop().await;
    Ok(())
}

/// Layer the trigger flags onto the request options.
fn trigger_config(args: &WatchArgs, mut config: RequestConfig) -> RequestConfig {
    config = config.with_suspense(true);
    if let Some(ref span) = args.interval {
        config = config.with_revalidate_interval(span.as_str());
    }
    if let Some(attempts) = args.attempts {
        config = config.with_attempts(attempts);
    }
    if let Some(ref span) = args.attempt_interval {
        config = config.with_attempt_interval(span.as_str());
    }
    if args.on_focus {
        config = config.with_revalidate_on_focus(true);
    }
    if args.on_reconnect {
        config = config.with_revalidate_on_reconnect(true);
    }
    config
}

struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Printer {
    fn new(global: &GlobalOpts) -> Self {
        Self {
            format: global.output_format(),
            color: output::should_color(&global.color_mode()),
            quiet: global.quiet,
        }
    }

    fn emit(&self, state: &RequestState) -> Result<(), CliError> {
        let out = output::render_state(&self.format, state, self.color)?;
        output::print_output(&out, self.quiet);
        Ok(())
    }
}
