use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, info, instrument, warn};

use sweeper_common::models::ScoreRecord;

use crate::error::StoreError;

/// Append-only log of finished games. Implementations may block; the
/// registry calls them from tokio's blocking pool.
pub trait ScoreRecorder: Send + Sync {
    fn record(&self, record: &ScoreRecord) -> Result<(), StoreError>;

    /// All records in append order, optionally only those of one player.
    fn query(&self, player_name: Option<&str>) -> Result<Vec<ScoreRecord>, StoreError>;
}

fn matches_player(record: &ScoreRecord, player_name: Option<&str>) -> bool {
    player_name.is_none_or(|name| record.player_name == name)
}

/// Scores kept as one JSON array in a file, rewritten on every append.
pub struct JsonScoreStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Recording scores to {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<ScoreRecord>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, records: &[ScoreRecord]) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ScoreRecorder for JsonScoreStore {
    #[instrument(level = "trace", skip(self), fields(player = %record.player_name))]
    fn record(&self, record: &ScoreRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut records = self.load()?;
        records.push(record.clone());
        self.store(&records)?;

        debug!("Score file now holds {} records", records.len());
        Ok(())
    }

    fn query(&self, player_name: Option<&str>) -> Result<Vec<ScoreRecord>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        let records = match self.load() {
            Ok(records) => records,
            Err(StoreError::Corrupt(e)) => {
                warn!("Score file {} is unreadable: {}", self.path.display(), e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(records
            .into_iter()
            .filter(|record| matches_player(record, player_name))
            .collect())
    }
}

/// In-process score log; nothing survives a restart.
#[derive(Default)]
pub struct MemoryScoreStore {
    records: Mutex<Vec<ScoreRecord>>,
}

impl ScoreRecorder for MemoryScoreStore {
    fn record(&self, record: &ScoreRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(record.clone());
        Ok(())
    }

    fn query(&self, player_name: Option<&str>) -> Result<Vec<ScoreRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .filter(|record| matches_player(record, player_name))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use sweeper_common::models::ScoreOutcome;

    use super::*;

    fn record(player: &str, outcome: ScoreOutcome) -> ScoreRecord {
        ScoreRecord {
            player_name: player.to_string(),
            outcome,
            duration_seconds: 12.5,
            board_size: "5x5".to_string(),
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonScoreStore::new(dir.path().join("scores.json"));
        assert!(store.query(None).unwrap().is_empty());
    }

    #[test]
    fn appends_survive_reopening_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");

        let store = JsonScoreStore::new(&path);
        store.record(&record("ada", ScoreOutcome::Win)).unwrap();
        store.record(&record("bob", ScoreOutcome::Lose)).unwrap();
        store.record(&record("ada", ScoreOutcome::Lose)).unwrap();

        let reopened = JsonScoreStore::new(&path);
        let all = reopened.query(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].player_name, "bob");

        let ada = reopened.query(Some("ada")).unwrap();
        assert_eq!(
            ada.iter().map(|r| r.outcome).collect::<Vec<_>>(),
            vec![ScoreOutcome::Win, ScoreOutcome::Lose]
        );
    }

    #[test]
    fn corrupt_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonScoreStore::new(&path);
        assert!(store.query(None).unwrap().is_empty());
        assert!(matches!(
            store.record(&record("ada", ScoreOutcome::Win)),
            Err(StoreError::Corrupt(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonScoreStore::new(dir.path().join("scores.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        store
                            .record(&record(&format!("p{i}"), ScoreOutcome::Win))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.query(None).unwrap().len(), 40);
        assert_eq!(store.query(Some("p3")).unwrap().len(), 5);
    }

    #[test]
    fn memory_store_filters_by_player() {
        let store = MemoryScoreStore::default();
        store.record(&record("ada", ScoreOutcome::Win)).unwrap();
        store.record(&record("bob", ScoreOutcome::Lose)).unwrap();

        assert_eq!(store.query(None).unwrap().len(), 2);
        assert_eq!(store.query(Some("bob")).unwrap()[0].outcome, ScoreOutcome::Lose);
        assert!(store.query(Some("eve")).unwrap().is_empty());
    }
}
