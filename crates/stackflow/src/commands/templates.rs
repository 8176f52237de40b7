use super::Globals;
use crate::TemplateCommands;
use colored::Colorize;
use stackflow_core::TemplateCheck;
use stackflow_core::workflows::validate_templates;
use stackflow_templates::TemplateRenderer;

pub async fn handle(globals: &Globals, cmd: TemplateCommands) -> anyhow::Result<()> {
    match cmd {
        TemplateCommands::List { prefix } => {
            let config = globals.try_load_config()?;
            for id in globals.store(config.as_ref()).list_all(&prefix)? {
                println!("{id}");
            }
            Ok(())
        }
        TemplateCommands::Show { id, rendered } => {
            let config = globals.try_load_config()?;
            let store = globals.store(config.as_ref());
            let content = if rendered {
                TemplateRenderer::new(store).render(&id, None)?.into_string()
            } else {
                store.resolve(&id)?
            };
            print!("{content}");
            Ok(())
        }
        TemplateCommands::Validate => validate(globals).await,
    }
}

async fn validate(globals: &Globals) -> anyhow::Result<()> {
    let config = globals.try_load_config()?.unwrap_or_default();
    let ctx = globals.context(config).await;

    println!("{}", "Validating templates...".blue());
    let reports = validate_templates(&ctx).await?;

    let mut invalid = 0;
    for report in &reports {
        match &report.check {
            TemplateCheck::Valid => println!("  {} {}", "✓".green(), report.id),
            TemplateCheck::Skipped => {
                println!("  {} {} {}", "-".dimmed(), report.id, "(empty)".dimmed())
            }
            TemplateCheck::Invalid(e) => {
                invalid += 1;
                println!("  {} {}", "✗".red(), report.id);
                println!("      {}", e.to_string().red());
            }
        }
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} of {} templates failed validation", reports.len());
    }
    println!("{}", "✓ All templates are valid".green().bold());
    Ok(())
}
