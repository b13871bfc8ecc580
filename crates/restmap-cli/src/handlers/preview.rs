//! Preview command handler

use crate::cli::OperationArgs;
use crate::error::Result;
use crate::output::OutputWriter;
use restmap_core::{ApiConfig, ApiController};
use tracing::instrument;

use super::utils::build_operation;

/// Print the signed request for an operation without sending it
#[instrument(skip_all, fields(path = %args.path_template, action = %args.action))]
pub async fn handle_preview(args: OperationArgs, api_config: ApiConfig, output: &mut OutputWriter) -> Result<()> {
    let operation = build_operation(&args)?;
    let controller = ApiController::new(api_config)?;

    let exchange = controller.prepare(&operation.config, &operation.metadata, operation.fields)?;

    output.section("Signed Request")?;
    output.exchange(&exchange)?;
    output.success("✓ Request built (not sent)")
}
