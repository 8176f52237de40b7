use super::{Globals, run_workflow};
use crate::EnvCommands;
use stackflow_core::workflows;

pub async fn handle(globals: &Globals, cmd: EnvCommands) -> anyhow::Result<()> {
    let ctx = globals.context(globals.load_config()?).await;
    match cmd {
        EnvCommands::Upsert { environment } => {
            run_workflow(workflows::environment_upsert(&ctx, &environment)).await
        }
        EnvCommands::Terminate { environment } => {
            run_workflow(workflows::environment_terminate(&ctx, &environment)).await
        }
    }
}
