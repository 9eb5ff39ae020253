use crate::utils;
use colored::Colorize;
use novaflow_cloud::ComputeClient;
use std::path::Path;

pub async fn handle(
    provider: &dyn ComputeClient,
    resources: &Path,
    project_tag: Option<&str>,
) -> anyhow::Result<()> {
    println!("{}", "Computing plan...".blue());
    println!("Resources: {}", resources.display().to_string().cyan());
    if let Some(tag) = project_tag {
        println!("Project tag: {}", tag.cyan());
    }

    let plan = novaflow_cloud::plan(provider, resources, project_tag).await?;

    println!();
    if plan.has_changes() {
        println!("{}", "Servers to create:".bold());
        utils::print_servers(&plan.to_create);
    } else {
        println!("{}", "Nothing to create; the project is up to date".green());
    }

    println!();
    println!("{}", plan.summary());
    Ok(())
}
