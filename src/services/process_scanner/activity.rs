use crate::config::DetectorConfig;
use crate::debug_if_enabled;
use crate::services::command::CommandRunner;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// PID -> время последней замеченной CPU-активности
pub struct ActivityTracker {
    recent: DashMap<u32, Instant>,
    ttl: Duration,
}

impl ActivityTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            recent: DashMap::new(),
            ttl,
        }
    }

    pub fn mark_active(&self, pid: u32, at: Instant) {
        self.recent.insert(pid, at);
    }

    pub fn last_active(&self, pid: u32) -> Option<Instant> {
        self.recent.get(&pid).map(|entry| *entry.value())
    }

    /// Удалить отметки старше TTL
    pub fn purge(&self, now: Instant) {
        let ttl = self.ttl;
        self.recent
            .retain(|_, seen| now.saturating_duration_since(*seen) <= ttl);
    }

    pub fn snapshot(&self) -> HashMap<u32, Instant> {
        self.recent
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

/// Разбор `ps -eo pid=,pcpu= --sort=-pcpu`: первые top_n строк, загрузка выше порога
pub fn parse_cpu_snapshot(output: &str, top_n: usize, threshold: f64) -> Vec<u32> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?.parse::<u32>().ok()?;
            let cpu = fields.next()?.parse::<f64>().ok()?;
            Some((pid, cpu))
        })
        .take(top_n)
        .filter(|(_, cpu)| *cpu > threshold)
        .map(|(pid, _)| pid)
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct SamplerSettings {
    period: Duration,
    top_n: usize,
    threshold: f64,
}

/// Фоновый сэмплер CPU: свой таймер, независимый от цикла опроса
pub struct CpuSampler {
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CpuSampler {
    /// Запускает задачу; вызывать внутри tokio runtime
    pub fn start(
        runner: Arc<dyn CommandRunner>,
        tracker: Arc<ActivityTracker>,
        config: &DetectorConfig,
    ) -> Self {
        let settings = SamplerSettings {
            period: config.sampler_interval(),
            top_n: config.sampler_top_n,
            threshold: config.sampler_cpu_threshold,
        };
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        info!("Запуск CPU сэмплера с интервалом {:?}", settings.period);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(settings.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::sample_once(runner.as_ref(), &tracker, settings.top_n, settings.threshold).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("CPU сэмплер остановлен");
        });

        Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Один замер: отметить активные PID и почистить старые отметки
    pub async fn sample_once(
        runner: &dyn CommandRunner,
        tracker: &ActivityTracker,
        top_n: usize,
        threshold: f64,
    ) {
        let output = match runner
            .stdout("ps", &["-eo", "pid=,pcpu=", "--sort=-pcpu"])
            .await
        {
            Ok(output) => output,
            Err(e) => {
                debug_if_enabled!("CPU замер не удался: {}", e);
                return;
            }
        };

        let now = Instant::now();
        let active = parse_cpu_snapshot(&output, top_n, threshold);
        debug_if_enabled!("Активные по CPU процессы: {:?}", active);
        for pid in active {
            tracker.mark_active(pid, now);
        }
        tracker.purge(now);
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Остановить и дождаться задачи. Повторный вызов ничего не делает.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                debug!("CPU сэмплер завершился с ошибкой: {}", e);
            }
        }
    }
}

impl Drop for CpuSampler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;

    const PS_OUTPUT: &str = "  4242 35.5\n   100  2.0\n   200  0.5\n   300  0.1\n garbage\n";

    #[test]
    fn parse_takes_top_rows_above_threshold() {
        assert_eq!(parse_cpu_snapshot(PS_OUTPUT, 10, 0.5), vec![4242, 100]);
        assert_eq!(parse_cpu_snapshot(PS_OUTPUT, 1, 0.5), vec![4242]);
        assert!(parse_cpu_snapshot("", 10, 0.5).is_empty());
    }

    #[test]
    fn purge_drops_old_marks() {
        let tracker = ActivityTracker::new(Duration::from_secs(30));
        let t0 = Instant::now();
        tracker.mark_active(1, t0);
        tracker.mark_active(2, t0 + Duration::from_secs(20));

        tracker.purge(t0 + Duration::from_secs(31));
        assert_eq!(tracker.last_active(1), None);
        assert_eq!(tracker.last_active(2), Some(t0 + Duration::from_secs(20)));
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn sample_once_marks_busy_processes() {
        let runner = FakeRunner::new().ok("ps -eo pid=,pcpu= --sort=-pcpu", PS_OUTPUT);
        let tracker = ActivityTracker::new(Duration::from_secs(30));

        CpuSampler::sample_once(&runner, &tracker, 10, 0.5).await;
        assert!(tracker.last_active(4242).is_some());
        assert!(tracker.last_active(100).is_some());
        assert!(tracker.last_active(300).is_none());
    }

    #[tokio::test]
    async fn sample_once_survives_missing_ps() {
        let runner = FakeRunner::new();
        let tracker = ActivityTracker::new(Duration::from_secs(30));
        CpuSampler::sample_once(&runner, &tracker, 10, 0.5).await;
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn sampler_runs_in_background_and_stops() {
        let runner = Arc::new(FakeRunner::new().ok("ps -eo pid=,pcpu= --sort=-pcpu", PS_OUTPUT));
        let tracker = Arc::new(ActivityTracker::new(Duration::from_secs(30)));
        let config = DetectorConfig {
            sampler_interval_ms: 100,
            ..DetectorConfig::default()
        };

        let sampler = CpuSampler::start(runner.clone(), tracker.clone(), &config);
        assert!(sampler.is_running());

        // Первый тик interval срабатывает сразу
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(tracker.last_active(4242).is_some());
        assert!(runner.call_count("ps -eo pid=,pcpu= --sort=-pcpu") >= 2);

        sampler.stop().await;
        assert!(!sampler.is_running());
        // Повторная остановка безопасна
        sampler.stop().await;
    }

    #[tokio::test]
    async fn zero_interval_does_not_panic() {
        let runner = Arc::new(FakeRunner::new().ok("ps -eo pid=,pcpu= --sort=-pcpu", PS_OUTPUT));
        let tracker = Arc::new(ActivityTracker::new(Duration::from_secs(30)));
        let config = DetectorConfig {
            sampler_interval_ms: 0,
            ..DetectorConfig::default()
        };

        let sampler = CpuSampler::start(runner, tracker.clone(), &config);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sampler.is_running());
        assert!(tracker.last_active(4242).is_some());
        sampler.stop().await;
    }
}
