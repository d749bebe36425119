use lingopane_core::{JsonFileStore, Paths, SettingsPatch, SettingsStore};

pub async fn show() -> anyhow::Result<()> {
    let store = JsonFileStore::new(Paths::new());
    let settings = store.load().await?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub async fn get(key: &str) -> anyhow::Result<()> {
    let store = JsonFileStore::new(Paths::new());
    let settings = store.load().await?;
    let value = serde_json::to_value(&settings)?;
    match value.get(key) {
        Some(v) => println!("{}", v),
        None => anyhow::bail!("unknown settings key: {}", key),
    }
    Ok(())
}

/// Applies a one-key patch through the same path the preferences surface
/// uses, then persists the result.
pub async fn set(key: &str, value: &str) -> anyhow::Result<()> {
    // booleans arrive as "true"/"false", everything else is a string
    let parsed: serde_json::Value = match value {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        other => serde_json::Value::String(other.to_string()),
    };

    let mut object = serde_json::Map::new();
    object.insert(key.to_string(), parsed);
    let patch: SettingsPatch = serde_json::from_value(serde_json::Value::Object(object))?;
    if patch == SettingsPatch::default() {
        anyhow::bail!("unknown settings key: {}", key);
    }

    let store = JsonFileStore::new(Paths::new());
    let mut settings = store.load().await?;
    settings.apply(&patch);
    store.save(&settings).await?;
    println!("{} updated", key);
    Ok(())
}
