//! `refetch span` -- time-span normalization.

use serde_json::json;

use refetch_core::normalize;

use crate::cli::{GlobalOpts, SpanArgs};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &SpanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let expr = args.expr.join(" ");
    let millis = normalize(&expr);

    let out = output::render_single(
        &global.output_format(),
        &json!({ "expr": expr, "millis": millis }),
        |_| millis.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
