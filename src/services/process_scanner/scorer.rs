use super::ancestry::AncestorChain;
use super::candidates::CandidateRecord;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const BASE_SCORE: f64 = 0.3;
pub const ENCLOSING_TERMINAL_BONUS: f64 = 10.0;
pub const ANCESTOR_BONUS: f64 = 5.0;
pub const FRESHNESS_BONUS: f64 = 0.2;

/// Бонус за недавнюю CPU-активность: (окно, вес), от самого свежего
const ACTIVITY_BONUSES: [(Duration, f64); 3] = [
    (Duration::from_secs(1), 0.5),
    (Duration::from_secs(5), 0.3),
    (Duration::from_secs(30), 0.1),
];

const FRESHNESS_WINDOW: Duration = Duration::from_secs(1);

/// Всё, что нужно для подсчёта очков одного прохода
#[derive(Debug, Clone)]
pub struct ScoringInput {
    pub enclosing_terminal: Option<u32>,
    pub ancestors: AncestorChain,
    pub activity: HashMap<u32, Instant>,
    pub now: Instant,
}

impl ScoringInput {
    pub fn new(now: Instant) -> Self {
        Self {
            enclosing_terminal: None,
            ancestors: AncestorChain::new(),
            activity: HashMap::new(),
            now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub record: CandidateRecord,
    pub score: f64,
}

pub fn activity_bonus(last_active: Option<Instant>, now: Instant) -> f64 {
    let Some(last_active) = last_active else {
        return 0.0;
    };
    let age = now.saturating_duration_since(last_active);
    ACTIVITY_BONUSES
        .iter()
        .find(|(window, _)| age < *window)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

/// Сумма независимых слагаемых; это ключ ранжирования, а не вероятность
pub fn score_candidate(record: &CandidateRecord, input: &ScoringInput) -> f64 {
    let mut score = BASE_SCORE;

    if input.enclosing_terminal == Some(record.pid) {
        score += ENCLOSING_TERMINAL_BONUS;
    }
    if input.ancestors.contains(&record.pid) {
        score += ANCESTOR_BONUS;
    }

    score += activity_bonus(input.activity.get(&record.pid).copied(), input.now);

    if input.now.saturating_duration_since(record.last_seen_at) < FRESHNESS_WINDOW {
        score += FRESHNESS_BONUS;
    }

    score
}

/// По убыванию счёта, при равенстве - по возрастанию PID
pub fn rank_candidates<I>(records: I, input: &ScoringInput) -> Vec<RankedCandidate>
where
    I: IntoIterator<Item = CandidateRecord>,
{
    let mut ranked: Vec<RankedCandidate> = records
        .into_iter()
        .map(|record| {
            let score = score_candidate(&record, input);
            RankedCandidate { record, score }
        })
        .collect();

    ranked.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.record.pid.cmp(&b.record.pid),
        other => other,
    });
    ranked
}
