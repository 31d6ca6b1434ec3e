//! Hybrid resolver: the public surface the poller depends on.
//!
//! One `get_active_application()` call is one complete attempt: window strategy
//! first, process scanner second, never in parallel and never retried.

use crate::config::DetectorConfig;
use crate::error::{DetectionError, Result};
use crate::events::{ActiveApplication, DetectionMethod, DisplayServerKind, IdleState};
use crate::services::context::DetectorContext;
use crate::services::process_scanner::{ProcessDetector, ProcessScanner};
use crate::services::window_detector::{
    create_window_strategy, Compositor, LockProbe, StrategySelection, WindowStrategy,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Снимок состояния детектора для диагностики
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorStatus {
    pub display_server: DisplayServerKind,
    pub window_strategy: Option<String>,
    pub window_available: bool,
    pub compositor: Option<Compositor>,
    pub process_scanner_available: bool,
    pub last_successful_method: Option<DetectionMethod>,
}

pub struct HybridDetector {
    window: Option<Box<dyn WindowStrategy>>,
    compositor: Option<Compositor>,
    process: Box<dyn ProcessDetector>,
    lock: LockProbe,
    last_method: RwLock<Option<DetectionMethod>>,
    closed: AtomicBool,
}

impl HybridDetector {
    /// Выбор стратегии и запуск CPU сэмплера. Вызывать внутри tokio runtime.
    pub fn new(config: &DetectorConfig, dry_run: bool) -> Self {
        let ctx = DetectorContext::system(config);
        let selection = create_window_strategy(&ctx, dry_run);
        let process = Box::new(ProcessScanner::new(ctx.clone()));
        Self::from_parts(selection, process, LockProbe::new(ctx))
    }

    pub fn from_parts(
        selection: StrategySelection,
        process: Box<dyn ProcessDetector>,
        lock: LockProbe,
    ) -> Self {
        let detector = Self {
            window: selection.strategy,
            compositor: selection.compositor,
            process,
            lock,
            last_method: RwLock::new(None),
            closed: AtomicBool::new(false),
        };
        info!(
            "Детектор готов: стратегия {}, сервер {}",
            detector.window.as_ref().map(|w| w.name()).unwrap_or("нет"),
            detector.display_server_kind()
        );
        detector
    }

    pub async fn get_active_application(&self) -> Result<ActiveApplication> {
        let window_failure = match &self.window {
            None => None,
            Some(strategy) if !strategy.is_available() => {
                Some(format!("стратегия {} недоступна", strategy.name()))
            }
            Some(strategy) => match strategy.try_get_focused_window().await {
                Ok(window) if window.has_application() => {
                    debug!("Окно от {}: {}", strategy.name(), window);
                    self.record(DetectionMethod::Window);
                    return Ok(ActiveApplication::from_window(&window));
                }
                Ok(window) => Some(format!("{}: окно без имени приложения ({})", strategy.name(), window)),
                Err(e) => {
                    debug!("Стратегия {} не дала окно: {}", strategy.name(), e);
                    Some(e.to_string())
                }
            },
        };

        let mut app = match self.process.detect().await {
            Ok(app) => app,
            Err(e) => {
                let err = DetectionError::AllMethodsFailed {
                    window: window_failure,
                    process: e.to_string(),
                };
                warn!("{}", err);
                return Err(err);
            }
        };

        // Отдельный повторный запрос окна: мог пройти, даже если первый сорвался
        if let Some(strategy) = &self.window {
            match strategy.try_get_focused_window().await {
                Ok(window) if app.matches_window(&window) => {
                    debug!("Процесс {} совпал с окном '{}'", app.process_name, window.title);
                    app.merge_window(&window);
                }
                Ok(_) => {}
                Err(e) => debug!("Повторный запрос окна не удался: {}", e),
            }
        }

        self.record(app.detection_method);
        Ok(app)
    }

    /// Никогда не возвращает ошибку: без данных о простое - "не простаивает"
    pub async fn get_idle_info(&self) -> IdleState {
        if let Some(strategy) = self.window.as_ref().filter(|s| s.is_available()) {
            match strategy.get_idle_info().await {
                Ok(state) => return state,
                Err(e) => debug!("Стратегия {} не дала данные о простое: {}", strategy.name(), e),
            }
        }
        IdleState::active(self.lock.is_locked(self.display_server_kind()).await)
    }

    pub fn is_available(&self) -> bool {
        self.window_available() || self.process.is_available()
    }

    fn window_available(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.is_available())
    }

    pub fn display_server_kind(&self) -> DisplayServerKind {
        self.window
            .as_ref()
            .map(|w| w.display_server())
            .unwrap_or(DisplayServerKind::ProcessBased)
    }

    pub fn compositor(&self) -> Option<Compositor> {
        self.compositor
    }

    pub fn last_successful_method(&self) -> Option<DetectionMethod> {
        *self.last_method.read()
    }

    pub fn status(&self) -> DetectorStatus {
        DetectorStatus {
            display_server: self.display_server_kind(),
            window_strategy: self.window.as_ref().map(|w| w.name().to_string()),
            window_available: self.window_available(),
            compositor: self.compositor,
            process_scanner_available: self.process.is_available(),
            last_successful_method: self.last_successful_method(),
        }
    }

    /// Останавливает сэмплер и освобождает стратегию. Повторный вызов ничего не делает.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.process.close().await;
        if let Some(strategy) = &self.window {
            strategy.close().await;
        }
        info!("Детектор остановлен");
    }

    fn record(&self, method: DetectionMethod) {
        *self.last_method.write() = Some(method);
    }
}
