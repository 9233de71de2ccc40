//! `refetch get` -- one suspense-mode request, final state printed.

use serde_json::Value;
use tracing::debug;

use refetch_core::Revalidator;

use crate::cli::{GetArgs, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: &GetArgs,
    revalidator: &Revalidator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let config = util::request_config(&args.request)?.with_suspense(true);
    let resource = revalidator.open(&args.request.url, config).await?;
    let state = resource.state();
    debug!(key = %state.key, status = ?state.status, "request settled");

    let format = global.output_format();
    let out = if args.data {
        let data = state.data.clone().unwrap_or(Value::Null);
        output::render_single(&format, &data, ToString::to_string)?
    } else {
        output::render_state(&format, &state, output::should_color(&global.color_mode()))?
    };
    output::print_output(&out, global.quiet);

    if state.error {
        return Err(CliError::RequestFailed {
            key: state.key.to_string(),
            status: state.status,
        });
    }
    Ok(())
}
