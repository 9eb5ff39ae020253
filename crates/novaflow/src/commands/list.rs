use novaflow_cloud::{ComputeClient, ServerAttribute};

pub async fn handle(
    provider: &dyn ComputeClient,
    project_tag: Option<&str>,
    ids: bool,
) -> anyhow::Result<()> {
    let attr = if ids {
        ServerAttribute::Id
    } else {
        ServerAttribute::Name
    };

    // One value per line so the output can be piped
    for value in novaflow_cloud::get_existing_servers(provider, project_tag, attr).await? {
        println!("{}", value);
    }
    Ok(())
}
