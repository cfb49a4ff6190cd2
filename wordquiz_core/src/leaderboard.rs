//! Global top-N leaderboard kept in a shared remote key-value bucket.
//!
//! The bucket holds the whole ranked list as one JSON array and only supports
//! whole-value reads and writes, so a submission is read-modify-write with no
//! locking: two players submitting at the same moment may overwrite each
//! other. Every network failure degrades to an empty list.

use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::config::LeaderboardConfig;
use crate::error::{QuizError, Result};

#[cfg_attr(feature = "python", pyclass(frozen))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub name: String,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub score: u32,
    /// RFC 3339 submission time.
    #[cfg_attr(feature = "python", pyo3(get))]
    pub date: String,
    /// Tag of the submission that created the entry. Entries written by
    /// older clients have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

#[cfg(feature = "python")]
#[pymethods]
impl LeaderboardEntry {
    fn __repr__(&self) -> String {
        format!("LeaderboardEntry(name='{}', score={})", self.name, self.score)
    }
}

/// A validated display name: trimmed, non-empty and length-limited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(QuizError::InvalidName("name is empty".to_string()));
        }
        if name.chars().count() > max_chars {
            return Err(QuizError::InvalidName(format!("name longer than {max_chars} characters")));
        }
        Ok(PlayerName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard request failed")]
    Http(#[from] reqwest::Error),

    #[error("leaderboard store answered with status {0}")]
    Status(u16),

    #[error("leaderboard payload could not be encoded")]
    Json(#[from] serde_json::Error),
}

/// Whole-value storage for the ranked list.
pub trait LeaderboardStore: Send + Sync {
    /// Current stored value, or `None` if nothing was ever written.
    fn load(&self) -> std::result::Result<Option<Value>, LeaderboardError>;

    /// Replace the stored value with `entries`.
    fn save(&self, entries: &[LeaderboardEntry]) -> std::result::Result<(), LeaderboardError>;
}

impl<S: LeaderboardStore + ?Sized> LeaderboardStore for Arc<S> {
    fn load(&self) -> std::result::Result<Option<Value>, LeaderboardError> {
        (**self).load()
    }

    fn save(&self, entries: &[LeaderboardEntry]) -> std::result::Result<(), LeaderboardError> {
        (**self).save(entries)
    }
}

/// Store backed by an HTTP key-value bucket (GET to read, POST to overwrite).
pub struct HttpStore {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpStore {
    pub fn new(config: &LeaderboardConfig) -> std::result::Result<Self, LeaderboardError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(HttpStore { client, url: config.url.clone() })
    }
}

impl LeaderboardStore for HttpStore {
    fn load(&self) -> std::result::Result<Option<Value>, LeaderboardError> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LeaderboardError::Status(status.as_u16()));
        }
        Ok(Some(response.json()?))
    }

    fn save(&self, entries: &[LeaderboardEntry]) -> std::result::Result<(), LeaderboardError> {
        let body = serde_json::to_string(entries)?;
        let response = self.client.post(&self.url).body(body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LeaderboardError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// In-process store, for offline play and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<Value>>,
}

impl MemoryStore {
    pub fn with_value(value: Value) -> Self {
        MemoryStore { value: Mutex::new(Some(value)) }
    }

    pub fn with_entries(entries: &[LeaderboardEntry]) -> std::result::Result<Self, LeaderboardError> {
        Ok(Self::with_value(serde_json::to_value(entries)?))
    }

    pub fn value(&self) -> Option<Value> {
        self.value.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl LeaderboardStore for MemoryStore {
    fn load(&self) -> std::result::Result<Option<Value>, LeaderboardError> {
        Ok(self.value())
    }

    fn save(&self, entries: &[LeaderboardEntry]) -> std::result::Result<(), LeaderboardError> {
        let value = serde_json::to_value(entries)?;
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
        Ok(())
    }
}

/// Ranked entries, plus the id of this player's submission if one was made.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standings {
    pub entries: Vec<LeaderboardEntry>,
    pub own_id: Option<Uuid>,
}

impl Standings {
    pub fn is_own(&self, entry: &LeaderboardEntry) -> bool {
        self.own_id.is_some() && entry.id == self.own_id
    }

    /// Zero-based position of this player's entry, if it made the list.
    pub fn own_rank(&self) -> Option<usize> {
        self.entries.iter().position(|e| self.is_own(e))
    }
}

pub struct Leaderboard {
    store: Box<dyn LeaderboardStore>,
    capacity: usize,
    max_name_chars: usize,
}

impl Leaderboard {
    pub fn new(store: Box<dyn LeaderboardStore>, config: &LeaderboardConfig) -> Self {
        Leaderboard { store, capacity: config.capacity, max_name_chars: config.max_name_chars }
    }

    /// Leaderboard on the configured HTTP bucket.
    pub fn http(config: &LeaderboardConfig) -> std::result::Result<Self, LeaderboardError> {
        Ok(Self::new(Box::new(HttpStore::new(config)?), config))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn parse_name(&self, raw: &str) -> Result<PlayerName> {
        PlayerName::parse(raw, self.max_name_chars)
    }

    /// Current top entries, best first. Empty if the bucket does not exist
    /// yet or cannot be reached.
    pub fn fetch_top(&self) -> Vec<LeaderboardEntry> {
        match self.store.load() {
            Ok(Some(value)) => self.normalise(value),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::error!("Leaderboard fetch error: {e}");
                Vec::new()
            }
        }
    }

    /// Whether `score` would enter the current list.
    pub fn qualifies(&self, score: u32) -> bool {
        qualifies_in(&self.fetch_top(), score, self.capacity)
    }

    /// Add a score and write the new top list back.
    ///
    /// Returns the list as written. If either the read or the write fails,
    /// nothing is changed and the result is empty.
    pub fn submit(&self, name: &PlayerName, score: u32) -> Standings {
        let mut entries = match self.store.load() {
            Ok(Some(value)) => self.normalise(value),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::error!("Leaderboard save error: could not read current list: {e}");
                return Standings::default();
            }
        };

        let id = Uuid::new_v4();
        entries.push(LeaderboardEntry {
            name: name.as_str().to_string(),
            score,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            id: Some(id),
        });
        rank(&mut entries, self.capacity);

        if let Err(e) = self.store.save(&entries) {
            log::error!("Leaderboard save error: {e}");
            return Standings::default();
        }

        log::info!("Submitted score {score} for '{}'", name.as_str());
        Standings { entries, own_id: Some(id) }
    }

    fn normalise(&self, value: Value) -> Vec<LeaderboardEntry> {
        let Value::Array(items) = value else {
            log::warn!("Leaderboard payload is not an array, treating as empty");
            return Vec::new();
        };
        let mut entries: Vec<LeaderboardEntry> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping malformed leaderboard entry: {e}");
                    None
                }
            })
            .collect();
        rank(&mut entries, self.capacity);
        entries
    }
}

/// Best first; equal scores keep their existing order.
fn rank(entries: &mut Vec<LeaderboardEntry>, capacity: usize) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(capacity);
}

pub fn qualifies_in(entries: &[LeaderboardEntry], score: u32, capacity: usize) -> bool {
    if entries.len() < capacity {
        return true;
    }
    entries.iter().map(|e| e.score).min().map_or(true, |lowest| score > lowest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuizConfig;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    fn entry(name: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry { name: name.into(), score, date: "2026-01-01T00:00:00.000Z".into(), id: None }
    }

    fn scores(entries: &[LeaderboardEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.score).collect()
    }

    fn config() -> LeaderboardConfig {
        QuizConfig::default().leaderboard
    }

    struct FailingStore {
        fail_load: bool,
    }

    impl LeaderboardStore for FailingStore {
        fn load(&self) -> std::result::Result<Option<Value>, LeaderboardError> {
            if self.fail_load {
                Err(LeaderboardError::Status(500))
            } else {
                Ok(Some(json!([])))
            }
        }
        fn save(&self, _: &[LeaderboardEntry]) -> std::result::Result<(), LeaderboardError> {
            Err(LeaderboardError::Status(503))
        }
    }

    fn board_with(entries: &[LeaderboardEntry]) -> (Leaderboard, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_entries(entries).unwrap());
        (Leaderboard::new(Box::new(store.clone()), &config()), store)
    }

    fn full_board() -> Vec<LeaderboardEntry> {
        [100, 90, 80, 70, 60].iter().enumerate().map(|(i, &s)| entry(&format!("p{i}"), s)).collect()
    }

    #[test]
    fn missing_bucket_reads_as_empty() {
        let board = Leaderboard::new(Box::new(MemoryStore::default()), &config());
        assert!(board.fetch_top().is_empty());
        assert!(board.qualifies(0));
    }

    #[test]
    fn non_array_payload_reads_as_empty() {
        let board = Leaderboard::new(Box::new(MemoryStore::with_value(json!({"oops": 1}))), &config());
        assert!(board.fetch_top().is_empty());
    }

    #[test]
    fn malformed_elements_are_skipped() {
        let value = json!([
            {"name": "ann", "score": 50, "date": "d"},
            {"name": "bad"},
            {"name": "bob", "score": 70, "date": "d"},
        ]);
        let board = Leaderboard::new(Box::new(MemoryStore::with_value(value)), &config());
        let top = board.fetch_top();
        assert_eq!(scores(&top), vec![70, 50]);
        assert_eq!(top[0].id, None);
    }

    #[test]
    fn fetch_is_idempotent() {
        let (board, _) = board_with(&full_board());
        assert_eq!(board.fetch_top(), board.fetch_top());
    }

    #[test]
    fn submission_inserts_and_drops_lowest() {
        let (board, store) = board_with(&full_board());
        let name = board.parse_name("  Mina ").unwrap();
        let standings = board.submit(&name, 95);
        assert_eq!(scores(&standings.entries), vec![100, 95, 90, 80, 70]);
        assert_eq!(standings.own_rank(), Some(1));
        assert_eq!(standings.entries[1].name, "Mina");
        assert_eq!(board.fetch_top(), standings.entries);
        let stored: Vec<LeaderboardEntry> = serde_json::from_value(store.value().unwrap()).unwrap();
        assert_eq!(stored.len(), 5);
    }

    #[test]
    fn submission_date_is_utc_rfc3339_with_millis() {
        let (board, _) = board_with(&[]);
        let before = Utc::now();
        let standings = board.submit(&board.parse_name("Mina").unwrap(), 40);
        let date = &standings.entries[0].date;

        let parsed = chrono::DateTime::parse_from_rfc3339(date).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert!(date.ends_with('Z'));
        let fraction = date.rsplit_once('.').unwrap().1.trim_end_matches('Z');
        assert_eq!(fraction.len(), 3);
        assert!((parsed.with_timezone(&Utc) - before).num_seconds().abs() < 60);
    }

    #[test]
    fn ties_keep_earlier_entries_first() {
        let (board, _) = board_with(&[entry("old", 50)]);
        let standings = board.submit(&board.parse_name("new").unwrap(), 50);
        assert_eq!(standings.entries[0].name, "old");
        assert_eq!(standings.entries[1].name, "new");
        assert_eq!(standings.own_rank(), Some(1));
    }

    #[test]
    fn low_score_on_full_board_is_not_kept() {
        let (board, _) = board_with(&full_board());
        let standings = board.submit(&board.parse_name("late").unwrap(), 10);
        assert_eq!(scores(&standings.entries), vec![100, 90, 80, 70, 60]);
        assert_eq!(standings.own_rank(), None);
    }

    #[test]
    fn qualification_rules() {
        let (board, _) = board_with(&full_board());
        assert!(board.qualifies(61));
        assert!(!board.qualifies(60));
        assert!(!board.qualifies(0));

        let (short, _) = board_with(&full_board()[..4]);
        assert!(short.qualifies(0));
    }

    #[test]
    fn failed_read_leaves_store_untouched() {
        let board = Leaderboard::new(Box::new(FailingStore { fail_load: true }), &config());
        assert!(board.fetch_top().is_empty());
        let standings = board.submit(&board.parse_name("x").unwrap(), 10);
        assert_eq!(standings, Standings::default());
    }

    #[test]
    fn failed_write_returns_empty() {
        let board = Leaderboard::new(Box::new(FailingStore { fail_load: false }), &config());
        let standings = board.submit(&board.parse_name("x").unwrap(), 10);
        assert!(standings.entries.is_empty());
        assert_eq!(standings.own_id, None);
    }

    #[test]
    fn names_are_validated() {
        assert!(matches!(PlayerName::parse("   ", 10), Err(QuizError::InvalidName(_))));
        assert!(matches!(PlayerName::parse("abcdefghijk", 10), Err(QuizError::InvalidName(_))));
        assert_eq!(PlayerName::parse(" 김민수 ", 10).unwrap().as_str(), "김민수");
        assert_eq!(PlayerName::parse("abcdefghij", 10).unwrap().as_str(), "abcdefghij");
    }

    #[test]
    fn entries_without_id_serialise_in_the_legacy_shape() {
        let value = serde_json::to_value(entry("ann", 10)).unwrap();
        assert_eq!(value, json!({"name": "ann", "score": 10, "date": "2026-01-01T00:00:00.000Z"}));
    }

    /// Serves one scripted HTTP response per connection and records request lines.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, std::thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/bucket", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some((key, value)) = line.split_once(':') {
                        if key.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                }
                let mut payload = vec![0; content_length];
                reader.read_exact(&mut payload).unwrap();
                requests.push(format!("{} {}", request_line.trim(), String::from_utf8_lossy(&payload)));

                let mut stream = reader.into_inner();
                write!(
                    stream,
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
            }
            requests
        });
        (url, handle)
    }

    fn http_config(url: String) -> LeaderboardConfig {
        LeaderboardConfig { url, ..config() }
    }

    #[test]
    fn http_store_reads_array_and_treats_404_as_empty() {
        let (url, server) = serve(vec![
            (200, r#"[{"name":"ann","score":30,"date":"d"}]"#),
            (404, ""),
        ]);
        let board = Leaderboard::http(&http_config(url)).unwrap();
        assert_eq!(scores(&board.fetch_top()), vec![30]);
        assert!(board.fetch_top().is_empty());
        server.join().unwrap();
    }

    #[test]
    fn http_store_server_error_reads_as_empty() {
        let (url, server) = serve(vec![(500, "boom")]);
        let board = Leaderboard::http(&http_config(url)).unwrap();
        assert!(board.fetch_top().is_empty());
        server.join().unwrap();
    }

    #[test]
    fn http_submit_posts_whole_list() {
        let (url, server) = serve(vec![(404, ""), (200, "")]);
        let board = Leaderboard::http(&http_config(url)).unwrap();
        let standings = board.submit(&board.parse_name("ann").unwrap(), 40);
        assert_eq!(scores(&standings.entries), vec![40]);

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET /bucket"));
        assert!(requests[1].starts_with("POST /bucket"));
        assert!(requests[1].contains(r#""name":"ann""#));
        assert!(requests[1].contains(r#""score":40"#));
    }

    #[test]
    fn unreachable_store_reads_as_empty() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/bucket", listener.local_addr().unwrap());
        drop(listener);
        let board = Leaderboard::http(&http_config(url)).unwrap();
        assert!(board.fetch_top().is_empty());
        assert_eq!(board.submit(&board.parse_name("ann").unwrap(), 10), Standings::default());
    }
}
