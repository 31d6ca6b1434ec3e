use super::classify::{classify, GuiClassification};
use super::table::ProcessEntry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_CANDIDATE_TTL: Duration = Duration::from_secs(5);

/// Процесс, признанный GUI кандидатом
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub pid: u32,
    pub command_name: String,
    pub command_line: String,
    pub classification: GuiClassification,
    pub last_seen_at: Instant,
    /// Счёт последнего ранжирования
    pub score: f64,
}

/// Таблица кандидатов. Скан и ранжирование могут идти одновременно с сэмплером.
pub struct CandidateTable {
    records: Mutex<HashMap<u32, CandidateRecord>>,
    ttl: Duration,
}

impl CandidateTable {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Обновить таблицу по снимку процессов и выселить устаревших. Возвращает число GUI процессов в снимке.
    pub fn refresh<I>(&self, entries: I, now: Instant) -> usize
    where
        I: IntoIterator<Item = ProcessEntry>,
    {
        let mut records = self.records.lock();
        let mut classified = 0;

        for entry in entries {
            let classification = classify(&entry);
            if !classification.is_gui() {
                continue;
            }
            classified += 1;

            let record = records.entry(entry.pid).or_insert_with(|| CandidateRecord {
                pid: entry.pid,
                command_name: String::new(),
                command_line: String::new(),
                classification,
                last_seen_at: now,
                score: 0.0,
            });
            record.command_name = entry.comm;
            record.command_line = entry.cmdline;
            record.classification = classification;
            record.last_seen_at = now;
        }

        Self::evict(&mut records, now, self.ttl);
        classified
    }

    fn evict(records: &mut HashMap<u32, CandidateRecord>, now: Instant, ttl: Duration) -> usize {
        let before = records.len();
        records.retain(|_, record| now.saturating_duration_since(record.last_seen_at) <= ttl);
        before - records.len()
    }

    pub fn set_score(&self, pid: u32, score: f64) {
        if let Some(record) = self.records.lock().get_mut(&pid) {
            record.score = score;
        }
    }

    pub fn snapshot(&self) -> Vec<CandidateRecord> {
        self.records.lock().values().cloned().collect()
    }

    pub fn get(&self, pid: u32) -> Option<CandidateRecord> {
        self.records.lock().get(&pid).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CandidateTable {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_TTL)
    }
}
