//! In-memory settlement archive
//!
//! Keeps every settled game for history queries and later verification, and
//! can export/import the archive as JSON lines for offline auditing.

use crate::common::traits::GameArchive;
use crate::common::types::PlayerId;
use crate::games::settlement::SettlementRecord;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive record on line {line} is invalid: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode archive record: {0}")]
    Encode(serde_json::Error),
}

/// Concurrent archive keyed by player, with a game id index
#[derive(Debug, Default)]
pub struct MemoryArchive {
    by_player: DashMap<PlayerId, Vec<SettlementRecord>>,
    by_game: DashMap<String, PlayerId>,
    count: AtomicUsize,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Players with at least one archived game, sorted
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.by_player.iter().map(|e| e.key().clone()).collect();
        players.sort();
        players
    }

    /// Write every record as one JSON object per line, grouped by player
    pub fn export_jsonl<W: Write>(&self, mut writer: W) -> Result<usize, ArchiveError> {
        let mut written = 0;
        for player in self.players() {
            for record in self.history(&player) {
                let line = serde_json::to_string(&record).map_err(ArchiveError::Encode)?;
                writeln!(writer, "{}", line)?;
                written += 1;
            }
        }
        writer.flush()?;
        Ok(written)
    }

    /// Load records previously written by `export_jsonl`; blank lines are skipped
    pub fn import_jsonl<R: BufRead>(&self, reader: R) -> Result<usize, ArchiveError> {
        let mut imported = 0;
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: SettlementRecord = serde_json::from_str(&line)
                .map_err(|source| ArchiveError::InvalidRecord { line: n + 1, source })?;
            self.archive(record);
            imported += 1;
        }
        debug!("Imported {} archived games", imported);
        Ok(imported)
    }
}

impl GameArchive for MemoryArchive {
    fn archive(&self, record: SettlementRecord) {
        match self.by_game.entry(record.game_id.clone()) {
            Entry::Occupied(_) => {
                debug!(game_id = %record.game_id, "Game already archived");
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(record.player.clone());
            }
        }
        self.by_player.entry(record.player.clone()).or_default().push(record);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn history(&self, player: &PlayerId) -> Vec<SettlementRecord> {
        self.by_player
            .get(player)
            .map(|records| records.value().clone())
            .unwrap_or_default()
    }

    fn find(&self, game_id: &str) -> Option<SettlementRecord> {
        let player = self.by_game.get(game_id)?.value().clone();
        self.by_player
            .get(&player)?
            .iter()
            .find(|r| r.game_id == game_id)
            .cloned()
    }

    fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Amount, Multiplier};
    use crate::games::types::{GameParams, GameState};
    use chrono::Utc;

    fn record(game_id: &str, player: &str) -> SettlementRecord {
        SettlementRecord {
            game_id: game_id.to_string(),
            player: PlayerId::from(player),
            params: GameParams { tile_count: 25, mine_count: 5 },
            stake: Amount::tokens(1),
            state: GameState::Lost,
            won: false,
            amount_won: Amount::ZERO,
            multiplier: Multiplier::ONE,
            revealed: vec![],
            exploded_at: Some(3),
            mine_positions: vec![1, 3, 5, 7, 9],
            server_seed: "00".repeat(32),
            server_seed_hash: "11".repeat(32),
            client_seed: "abcd".to_string(),
            nonce: 0,
            started_at: Utc::now(),
            settled_at: Utc::now(),
        }
    }

    #[test]
    fn test_archive_and_query() {
        let archive = MemoryArchive::new();
        assert!(archive.is_empty());

        archive.archive(record("g1", "alice"));
        archive.archive(record("g2", "alice"));
        archive.archive(record("g3", "bob"));
        archive.archive(record("g1", "alice"));

        assert_eq!(archive.len(), 3);
        let history: Vec<String> = archive
            .history(&PlayerId::from("alice"))
            .into_iter()
            .map(|r| r.game_id)
            .collect();
        assert_eq!(history, vec!["g1", "g2"]);
        assert_eq!(archive.find("g3").map(|r| r.player), Some(PlayerId::from("bob")));
        assert!(archive.find("nope").is_none());
        assert!(archive.history(&PlayerId::from("carol")).is_empty());
    }

    #[test]
    fn test_jsonl_export_import() {
        let archive = MemoryArchive::new();
        archive.archive(record("g1", "alice"));
        archive.archive(record("g2", "bob"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(archive.export_jsonl(file.as_file_mut()).unwrap(), 2);

        let restored = MemoryArchive::new();
        let reader = std::io::BufReader::new(std::fs::File::open(file.path()).unwrap());
        assert_eq!(restored.import_jsonl(reader).unwrap(), 2);
        assert_eq!(restored.find("g2"), archive.find("g2"));
        assert_eq!(restored.players(), vec![PlayerId::from("alice"), PlayerId::from("bob")]);
    }

    #[test]
    fn test_import_reports_bad_line() {
        let archive = MemoryArchive::new();
        let input = "\nnot json\n";
        let err = archive.import_jsonl(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidRecord { line: 2, .. }));
    }
}
