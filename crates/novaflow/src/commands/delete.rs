use colored::Colorize;
use novaflow_cloud::{ComputeClient, ServerAttribute};

pub async fn handle(
    provider: &dyn ComputeClient,
    project_tag: &str,
    yes: bool,
) -> anyhow::Result<()> {
    if project_tag.is_empty() {
        anyhow::bail!("a non-empty project tag is required");
    }

    if !yes {
        let names =
            novaflow_cloud::get_existing_servers(provider, Some(project_tag), ServerAttribute::Name)
                .await?;
        if names.is_empty() {
            println!("{}", "No servers match the project tag".dimmed());
            return Ok(());
        }

        println!("{}", format!("Servers to delete ({}):", names.len()).bold());
        for name in &names {
            println!("  • {}", name.cyan());
        }
        println!();
        println!("Pass --yes to delete them");
        return Ok(());
    }

    let deleted = novaflow_cloud::delete_servers(provider, project_tag).await?;
    println!(
        "{}",
        format!("Deleted {} servers tagged '{}'", deleted.len(), project_tag).green()
    );
    Ok(())
}
