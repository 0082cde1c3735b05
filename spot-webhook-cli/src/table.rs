use anyhow::Context as _;
use std::{collections::BTreeMap, path::Path};

/// Reads assignment table from a file.
/// Numbers are accepted as values, since `30` is easier to write than `"30"`.
pub(crate) async fn load(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse(raw: &[u8]) -> anyhow::Result<BTreeMap<String, String>> {
    let entries: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_slice(raw)?;
    entries
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                other => anyhow::bail!("value of '{}' must be a string, got {:?}", key, other),
            };
            Ok((key, value))
        })
        .collect()
}
