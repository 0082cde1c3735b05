mod cli;
mod table;

use anyhow::Context as _;
use clap::Parser;
use spot_webhook::{AssignmentStore, HookConfig, InMemoryStore, Server, SpotHook};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = cli::Args::parse();
    tracing::info!(args = ?args, "parsed command-line arguments");
    args.hook.validate()?;
    match args.command {
        cli::Command::Resource => {
            print_resource(&SpotHook::new(InMemoryStore::new(), args.hook));
            Ok(())
        }
        cli::Command::Review(review) => run_review(args.hook, review).await,
    }
}

fn print_resource<S: AssignmentStore>(hook: &SpotHook<S>) {
    let (gvr, singular) = hook.mutating_resource();
    println!("group:    {}", gvr.group);
    println!("version:  {}", gvr.version);
    println!("resource: {}", gvr.resource);
    println!("singular: {}", singular);
}

async fn read_input(review: &cli::Review) -> anyhow::Result<Vec<u8>> {
    match &review.input {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

async fn write_output(body: &[u8]) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(body).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

async fn run_review(config: HookConfig, review: cli::Review) -> anyhow::Result<()> {
    let body = read_input(&review).await?;
    match &review.table {
        Some(path) => {
            let data = table::load(path).await?;
            let store = InMemoryStore::new();
            store.put(&config.configmap_namespace, &config.configmap_name, Some(data));
            let (namespace, name) = (
                config.configmap_namespace.clone(),
                config.configmap_name.clone(),
            );
            let server = Server::new(SpotHook::new(store, config));
            write_output(&server.review_json(&body).await?).await?;

            let remaining = server
                .hook()
                .store()
                .data(&namespace, &name)
                .unwrap_or_default();
            eprint!("{}", serde_yaml::to_string(&remaining)?);
        }
        None => {
            tracing::info!("Connecting to kube");
            let client = kube::Client::try_default().await?;
            let server = Server::new(SpotHook::new(client, config));
            write_output(&server.review_json(&body).await?).await?;
        }
    }
    Ok(())
}
