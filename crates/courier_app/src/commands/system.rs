use courier_engine::{IngestionClient, OrchestratorClient};
use courier_logging::courier_warn;

use crate::config::AppConfig;

pub(super) async fn health(config: &AppConfig) -> anyhow::Result<()> {
    let ingestion = IngestionClient::new(config.client.clone())?;
    let orchestrator = OrchestratorClient::new(config.client.clone())?;

    let (ingestion_ok, orchestrator_ok) = tokio::join!(ingestion.health(), orchestrator.health());
    let mut healthy = true;
    for (name, url, result) in [
        ("ingestion", &config.client.ingestion_url, ingestion_ok),
        ("orchestrator", &config.client.orchestrator_url, orchestrator_ok),
    ] {
        match result {
            Ok(()) => println!("{name:<13} ok           {url}"),
            Err(err) => {
                courier_warn!("{} health check failed: {}", name, err.detail());
                healthy = false;
                println!("{name:<13} unavailable  {url} ({})", err.reason());
            }
        }
    }

    if !healthy {
        anyhow::bail!("one or more services are unavailable");
    }
    Ok(())
}

pub(super) async fn domains(config: &AppConfig) -> anyhow::Result<()> {
    let client = IngestionClient::new(config.client.clone())?;
    let domains = client.domains().await?;
    if domains.is_empty() {
        println!("No domains configured.");
    }
    for domain in domains {
        if domain.description.is_empty() {
            println!("{}\t{}", domain.id, domain.name);
        } else {
            println!("{}\t{}\t{}", domain.id, domain.name, domain.description);
        }
    }
    Ok(())
}

pub(super) async fn file_types(config: &AppConfig) -> anyhow::Result<()> {
    let client = IngestionClient::new(config.client.clone())?;
    for file_type in client.supported_file_types().await? {
        println!(
            "{:<7} {:<4} MB  {:<30} {}",
            file_type.extension, file_type.max_size_mb, file_type.mime_type, file_type.description
        );
    }
    Ok(())
}
