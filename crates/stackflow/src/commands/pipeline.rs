use super::{Globals, run_workflow};
use crate::PipelineCommands;
use stackflow_core::workflows;

pub async fn handle(globals: &Globals, cmd: PipelineCommands) -> anyhow::Result<()> {
    let ctx = globals.context(globals.load_config()?).await;
    match cmd {
        PipelineCommands::Upsert { service } => {
            run_workflow(workflows::pipeline_upsert(&ctx, service.as_deref())).await
        }
        PipelineCommands::Terminate { service } => {
            run_workflow(workflows::pipeline_terminate(&ctx, service.as_deref())).await
        }
    }
}
