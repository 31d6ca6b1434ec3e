//! Определение активного приложения по таблице процессов.
//!
//! Скан классифицирует процессы как GUI кандидатов, ранжирование складывает
//! бонусы за родство с процессом детектора и недавнюю CPU-активность.
//! Фоновый сэмплер CPU живёт от создания сканера до `close()`.

pub mod activity;
pub mod ancestry;
pub mod candidates;
pub mod classify;
pub mod scorer;
pub mod table;
pub mod title;

pub use activity::{ActivityTracker, CpuSampler};
pub use ancestry::AncestryScorer;
pub use candidates::{CandidateRecord, CandidateTable};
pub use classify::GuiClassification;
pub use scorer::{rank_candidates, RankedCandidate, ScoringInput};
pub use table::{ProcessEntry, ProcessTable, ProcfsTable};

use crate::error::{DetectionError, Result};
use crate::events::ActiveApplication;
use crate::services::context::DetectorContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Путь определения через процессы, как его видит резолвер
#[async_trait]
pub trait ProcessDetector: Send + Sync {
    async fn detect(&self) -> Result<ActiveApplication>;

    fn is_available(&self) -> bool;

    async fn close(&self) {}
}

pub struct ProcessScanner {
    ctx: DetectorContext,
    candidates: CandidateTable,
    activity: Arc<ActivityTracker>,
    sampler: Option<CpuSampler>,
    ancestry: AncestryScorer,
}

impl ProcessScanner {
    /// Создаёт сканер и запускает CPU сэмплер. Нужен работающий tokio runtime.
    pub fn new(ctx: DetectorContext) -> Self {
        let mut scanner = Self::without_sampler(ctx, std::process::id());
        scanner.sampler = Some(CpuSampler::start(
            Arc::clone(&scanner.ctx.runner),
            Arc::clone(&scanner.activity),
            &scanner.ctx.config,
        ));
        scanner
    }

    /// Без фонового сэмплера; отметки активности ставятся через `activity()`
    pub fn without_sampler(ctx: DetectorContext, origin_pid: u32) -> Self {
        let candidates = CandidateTable::new(ctx.config.candidate_ttl());
        let activity = Arc::new(ActivityTracker::new(ctx.config.activity_ttl()));
        let ancestry = AncestryScorer::new(Arc::clone(&ctx.processes), origin_pid);
        Self {
            ctx,
            candidates,
            activity,
            sampler: None,
            ancestry,
        }
    }

    pub fn activity(&self) -> &Arc<ActivityTracker> {
        &self.activity
    }

    pub fn candidates(&self) -> &CandidateTable {
        &self.candidates
    }

    pub fn ancestry(&self) -> &AncestryScorer {
        &self.ancestry
    }

    pub fn scan(&self) -> Result<usize> {
        self.scan_at(Instant::now())
    }

    /// Полный проход по таблице процессов с обновлением кандидатов
    pub fn scan_at(&self, now: Instant) -> Result<usize> {
        let entries = self.ctx.processes.entries()?;
        let total = entries.len();
        let classified = self.candidates.refresh(entries, now);
        debug!("Скан процессов: {} всего, {} GUI кандидатов", total, classified);
        Ok(classified)
    }

    pub fn rank(&self, now: Instant) -> Vec<RankedCandidate> {
        let input = ScoringInput {
            enclosing_terminal: self.ancestry.find_enclosing_terminal(),
            ancestors: self.ancestry.ancestors(),
            activity: self.activity.snapshot(),
            now,
        };

        let ranked = rank_candidates(self.candidates.snapshot(), &input);
        for candidate in &ranked {
            self.candidates.set_score(candidate.record.pid, candidate.score);
        }
        ranked
    }
}

#[async_trait]
impl ProcessDetector for ProcessScanner {
    async fn detect(&self) -> Result<ActiveApplication> {
        if !self.is_available() {
            return Err(DetectionError::ToolUnavailable("/proc".to_string()));
        }

        let now = Instant::now();
        self.scan_at(now)?;

        let top = self
            .rank(now)
            .into_iter()
            .next()
            .ok_or(DetectionError::NoGuiProcessDetected)?;

        debug!(
            "Лучший кандидат: {} (pid {}, счёт {:.2})",
            top.record.command_name, top.record.pid, top.score
        );

        let title = title::title_for_pid(&self.ctx, top.record.pid).await;
        // Счёт ранжирования идёт в confidence как есть, может быть больше 1.0
        Ok(ActiveApplication::from_process(
            &top.record.command_name,
            top.record.pid,
            &title,
            top.score,
        ))
    }

    fn is_available(&self) -> bool {
        self.ctx.processes.is_available()
    }

    async fn close(&self) {
        if let Some(sampler) = &self.sampler {
            sampler.stop().await;
        }
    }
}
