use crate::utils;
use colored::Colorize;
use novaflow_cloud::{ApplyOptions, ComputeClient};
use std::path::Path;
use std::time::Duration;

pub async fn handle(
    provider: &dyn ComputeClient,
    resources: &Path,
    user_data: &Path,
    key_name: &str,
    project_tag: Option<&str>,
    mappings: Option<&Path>,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    println!("{}", "Applying resources...".blue().bold());
    println!("Resources: {}", resources.display().to_string().cyan());

    let mappings = match mappings {
        Some(path) => {
            println!("Mappings: {}", path.display().to_string().cyan());
            Some(novaflow_cloud::read_mappings(path).await?)
        }
        None => None,
    };

    let plan = novaflow_cloud::plan(provider, resources, project_tag).await?;
    println!("{}", plan.summary());

    if !plan.has_changes() {
        println!("{}", "Nothing to create; the project is up to date".green());
        return Ok(());
    }

    println!();
    println!("{}", "Creating servers:".bold());
    utils::print_servers(&plan.to_create);

    let options = ApplyOptions {
        poll_interval,
        mappings,
    };
    let result =
        novaflow_cloud::create_servers(provider, &plan.to_create, user_data, key_name, &options)
            .await?;

    let not_active = result.not_active();
    println!();
    for server in &result.created {
        if not_active.iter().any(|s| s.id == server.id) {
            println!(
                "  ⚠ {} ({}) {}",
                server.name.cyan(),
                server.id,
                server.status.to_string().yellow()
            );
        } else {
            println!("  ✓ {} ({}) {}", server.name.cyan(), server.id, server.status);
        }
    }

    println!();
    println!(
        "{}",
        format!(
            "Created {} servers in {:.1}s",
            result.created.len(),
            result.duration_ms as f64 / 1000.0
        )
        .green()
    );
    if !not_active.is_empty() {
        println!(
            "{}",
            format!("{} servers did not become ACTIVE", not_active.len()).yellow()
        );
    }
    Ok(())
}
