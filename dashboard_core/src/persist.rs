use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::CardGeometry;

/// One card entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCard {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub layout: CardGeometry,
}

/// A saved arrangement: ordered card geometry plus the opaque style blobs
/// the styling collaborator keyed by card id. The engine round-trips
/// `themes` without looking inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLayout {
    pub cards: Vec<PersistedCard>,

    #[serde(default)]
    pub themes: BTreeMap<String, serde_json::Value>,

    /// Epoch millis, stamped at serialize time.
    #[serde(rename = "updatedAt", default)]
    pub updated_at: u64,
}

/// Storage capability injected into the hosts. The engine never talks to a
/// concrete storage mechanism directly.
pub trait PersistenceAdapter {
    /// Load the snapshot stored under `key`. A missing or unreadable
    /// snapshot is `None`, never an error: a broken layout must not stop
    /// the user from editing.
    fn load(&self, key: &str) -> anyhow::Result<Option<PersistedLayout>>;

    fn save(&self, key: &str, snapshot: &PersistedLayout) -> anyhow::Result<()>;
}

/// One JSON file per layout key, under a base directory.
#[derive(Debug, Clone)]
pub struct JsonFileAdapter {
    dir: PathBuf,
}

impl JsonFileAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PersistenceAdapter for JsonFileAdapter {
    fn load(&self, key: &str) -> anyhow::Result<Option<PersistedLayout>> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("read layout file {}", path.display()));
            }
        };

        match serde_json::from_str::<PersistedLayout>(&text) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                log::warn!(
                    "discarding malformed layout snapshot {}: {err}",
                    path.display()
                );
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, snapshot: &PersistedLayout) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create layout dir {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(snapshot).context("serialize layout to json")?;
        let path = self.path_for(key);
        fs::write(&path, json).with_context(|| format!("write layout file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "dashboard_persist_{tag}_{:08x}",
            rand::random::<u32>()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_snapshot() -> PersistedLayout {
        PersistedLayout {
            cards: vec![PersistedCard {
                id: "clock-1-abcd".to_string(),
                content_type: "clock".to_string(),
                layout: CardGeometry {
                    x: 2,
                    y: 0,
                    w: 2,
                    h: 2,
                    scale: 1.0,
                },
            }],
            themes: [(
                "clock-1-abcd".to_string(),
                serde_json::json!({"accent": "#7766ff"}),
            )]
            .into_iter()
            .collect(),
            updated_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn save_then_load_round_trips() -> anyhow::Result<()> {
        let dir = scratch_dir("roundtrip");
        let adapter = JsonFileAdapter::new(&dir);

        let snapshot = sample_snapshot();
        adapter.save("home", &snapshot)?;
        let loaded = adapter.load("home")?.expect("snapshot should exist");

        assert_eq!(loaded, snapshot);
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn missing_key_loads_as_none() -> anyhow::Result<()> {
        let dir = scratch_dir("missing");
        let adapter = JsonFileAdapter::new(&dir);
        assert!(adapter.load("nothing-here")?.is_none());
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn malformed_json_loads_as_none() -> anyhow::Result<()> {
        let dir = scratch_dir("malformed");
        let adapter = JsonFileAdapter::new(&dir);
        fs::write(dir.join("broken.json"), "{ not json")?;
        assert!(adapter.load("broken")?.is_none());
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn missing_geometry_field_discards_snapshot() -> anyhow::Result<()> {
        let dir = scratch_dir("fields");
        let adapter = JsonFileAdapter::new(&dir);
        fs::write(
            dir.join("partial.json"),
            r#"{"cards":[{"id":"a","type":"clock","layout":{"x":0,"y":0}}]}"#,
        )?;
        assert!(adapter.load("partial")?.is_none());
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn theme_blobs_round_trip_verbatim() -> anyhow::Result<()> {
        let dir = scratch_dir("themes");
        let adapter = JsonFileAdapter::new(&dir);

        let mut snapshot = sample_snapshot();
        snapshot.themes.insert(
            "other".to_string(),
            serde_json::json!({"nested": {"deep": [1, 2, 3]}}),
        );
        adapter.save("home", &snapshot)?;
        let loaded = adapter.load("home")?.expect("snapshot should exist");

        assert_eq!(loaded.themes, snapshot.themes);
        fs::remove_dir_all(dir)?;
        Ok(())
    }
}
