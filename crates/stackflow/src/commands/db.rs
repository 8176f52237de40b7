use super::{Globals, run_workflow};
use crate::DbCommands;
use stackflow_core::workflows;

pub async fn handle(globals: &Globals, cmd: DbCommands) -> anyhow::Result<()> {
    let ctx = globals.context(globals.load_config()?).await;
    match cmd {
        DbCommands::Upsert {
            environment,
            service,
        } => {
            run_workflow(workflows::database_upsert(
                &ctx,
                &environment,
                service.as_deref(),
            ))
            .await
        }
        DbCommands::Terminate {
            environment,
            service,
        } => {
            run_workflow(workflows::database_terminate(
                &ctx,
                &environment,
                service.as_deref(),
            ))
            .await
        }
    }
}
