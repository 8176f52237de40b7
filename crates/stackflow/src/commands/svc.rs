use super::{Globals, run_workflow};
use crate::SvcCommands;
use stackflow_core::workflows;

pub async fn handle(globals: &Globals, cmd: SvcCommands) -> anyhow::Result<()> {
    let ctx = globals.context(globals.load_config()?).await;
    match cmd {
        SvcCommands::Deploy {
            environment,
            service,
            revision,
        } => {
            run_workflow(workflows::service_deploy(
                &ctx,
                &environment,
                service.as_deref(),
                revision.as_deref(),
            ))
            .await
        }
        SvcCommands::Terminate {
            environment,
            service,
        } => {
            run_workflow(workflows::service_terminate(
                &ctx,
                &environment,
                service.as_deref(),
            ))
            .await
        }
    }
}
