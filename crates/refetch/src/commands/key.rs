//! `refetch key` -- show the cache key a request resolves to.

use refetch_core::resolve_key;

use crate::cli::{GlobalOpts, KeyArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &KeyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::request_config(&args.request)?;
    let key = resolve_key(&args.request.url, &config);

    let out = output::render_single(&global.output_format(), &key.to_value(), |_| {
        key.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
