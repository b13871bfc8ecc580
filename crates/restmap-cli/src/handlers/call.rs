//! Call command handler

use crate::cli::OperationArgs;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use restmap_core::{ApiConfig, ApiController};
use tracing::{info, instrument};

use super::utils::build_operation;

/// Execute the operation and print the response map
#[instrument(skip_all, fields(path = %args.path_template, action = %args.action))]
pub async fn handle_call(args: OperationArgs, api_config: ApiConfig, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("call_command", &format!("{} {}", args.action, args.path_template));
    let operation = build_operation(&args)?;
    let controller = ApiController::new(api_config)?;

    output.info(&format!(
        "{} {} on {} ({})",
        args.action.method(),
        args.path_template,
        controller.config().base_url(),
        controller.config().environment
    ))?;

    let response = controller
        .execute(&operation.config, &operation.metadata, operation.fields)
        .await?;
    info!(keys = response.size(), "Operation succeeded");

    output.section("Response")?;
    output.data(&response)
}
