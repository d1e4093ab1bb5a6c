use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use snapshot_vault::config::PublishConfig;
use snapshot_vault::maven::timestamp::BuildCommencedTime;
use snapshot_vault::publish::publisher::MavenRemotePublisher;
use snapshot_vault::transport::DefaultTransportFactory;

/// Publishes a snapshot version of a module to a Maven repository, assigning it the next
///  timestamped build number
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// the publish.toml describing repository, module and artifacts
    #[arg(short, long, default_value = "publish.toml")]
    config: PathBuf,

    /// overrides the repository URL from the config file
    #[arg(long)]
    repository_url: Option<String>,

    #[arg(long, env = "SNAPSHOT_VAULT_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "SNAPSHOT_VAULT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // capture the build time before anything else, all timestamps of this publish derive from it
    let build_time = BuildCommencedTime::now();

    let args = Args::parse();

    let mut config = PublishConfig::load(&args.config)?;
    config.apply_overrides(args.repository_url, args.username, args.password);

    let repository = config.repository_descriptor()?;
    let base_dir = args.config.parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let publication = config.load_publication(&base_dir).await?;

    let publisher = MavenRemotePublisher::new(
        Arc::new(DefaultTransportFactory::default()),
        Arc::new(build_time),
        config.options(),
    );

    let report = publisher.publish(&publication, &repository)
        .await
        .with_context(|| format!("publishing {} to '{}'", publication.coordinates, repository.name))?;

    info!("published {} as {} (build {})", publication.coordinates, report.timestamped_version, report.identity.build_number);
    for path in &report.uploaded {
        info!("  {}", path);
    }
    Ok(())
}
