//! Подставные реализации швов детектора для тестов.

use crate::config::DetectorConfig;
use crate::error::{DetectionError, Result};
use crate::events::{ActiveApplication, DisplayServerKind, IdleState, WindowInfo};
use crate::services::bus::DesktopBus;
use crate::services::command::{describe, CommandOutput, CommandRunner};
use crate::services::context::{DetectorContext, SessionEnv};
use crate::services::process_scanner::{ProcessDetector, ProcessEntry, ProcessTable};
use crate::services::tools::{PathLookup, ToolProbe};
use crate::services::window_detector::WindowStrategy;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Ответы по полной командной строке; неизвестная команда - утилиты нет
#[derive(Clone, Default)]
pub struct FakeRunner {
    responses: Arc<Mutex<HashMap<String, CommandOutput>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, command: &str, stdout: &str) -> Self {
        self.responses.lock().insert(
            command.to_string(),
            CommandOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    pub fn fail(self, command: &str, stderr: &str) -> Self {
        self.responses.lock().insert(
            command.to_string(),
            CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls.lock().iter().filter(|call| *call == command).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let command = describe(program, args);
        self.calls.lock().push(command.clone());
        self.responses
            .lock()
            .get(&command)
            .cloned()
            .ok_or_else(|| DetectionError::ToolUnavailable(program.to_string()))
    }
}

#[derive(Default)]
pub struct FakeProcessTable {
    entries: BTreeMap<u32, ProcessEntry>,
    unavailable: bool,
}

impl FakeProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            entries: BTreeMap::new(),
            unavailable: true,
        }
    }

    pub fn with(mut self, pid: u32, ppid: u32, comm: &str, cmdline: &str, has_display_env: bool) -> Self {
        self.entries.insert(
            pid,
            ProcessEntry {
                pid,
                ppid,
                comm: comm.to_string(),
                cmdline: cmdline.to_string(),
                has_display_env,
            },
        );
        self
    }
}

impl ProcessTable for FakeProcessTable {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn pids(&self) -> Result<Vec<u32>> {
        if self.unavailable {
            return Err(DetectionError::Internal("нет /proc".to_string()));
        }
        Ok(self.entries.keys().copied().collect())
    }

    fn read(&self, pid: u32) -> Option<ProcessEntry> {
        self.entries.get(&pid).cloned()
    }
}

/// Шина: незаданный ответ - ошибка "недоступно"
#[derive(Default)]
pub struct FakeBus {
    eval: Option<(bool, String)>,
    screensaver: Option<bool>,
    locked_hint: Option<bool>,
    idle_ms: Option<u64>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eval(mut self, success: bool, result: &str) -> Self {
        self.eval = Some((success, result.to_string()));
        self
    }

    pub fn screensaver(mut self, active: bool) -> Self {
        self.screensaver = Some(active);
        self
    }

    pub fn locked_hint(mut self, locked: bool) -> Self {
        self.locked_hint = Some(locked);
        self
    }

    pub fn idle_ms(mut self, ms: u64) -> Self {
        self.idle_ms = Some(ms);
        self
    }

    fn reply<T: Clone>(value: &Option<T>) -> Result<T> {
        value
            .clone()
            .ok_or_else(|| DetectionError::ToolUnavailable("dbus".to_string()))
    }
}

#[async_trait]
impl DesktopBus for FakeBus {
    async fn shell_eval(&self, _script: &str) -> Result<(bool, String)> {
        Self::reply(&self.eval)
    }

    async fn screensaver_active(&self) -> Result<bool> {
        Self::reply(&self.screensaver)
    }

    async fn session_locked_hint(&self) -> Result<bool> {
        Self::reply(&self.locked_hint)
    }

    async fn idle_time_ms(&self) -> Result<u64> {
        Self::reply(&self.idle_ms)
    }
}

/// PATH из фиксированного набора имён со счётчиком обращений
pub struct FakeLookup {
    present: HashSet<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeLookup {
    pub fn new(present: &[&str]) -> Self {
        Self {
            present: present.iter().map(|name| name.to_string()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PathLookup for FakeLookup {
    fn lookup(&self, name: &str) -> Option<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.present
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }
}

/// Стратегия окна: сначала очередь ответов, потом окно по умолчанию
pub struct FakeWindowStrategy {
    available: bool,
    queued: Mutex<VecDeque<Result<WindowInfo>>>,
    window: Option<WindowInfo>,
    idle: Option<IdleState>,
    calls: Arc<AtomicUsize>,
}

impl FakeWindowStrategy {
    pub fn new() -> Self {
        Self {
            available: true,
            queued: Mutex::new(VecDeque::new()),
            window: None,
            idle: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn window(mut self, window: WindowInfo) -> Self {
        self.window = Some(window);
        self
    }

    pub fn then_err(self, err: DetectionError) -> Self {
        self.queued.lock().push_back(Err(err));
        self
    }

    pub fn idle(mut self, state: IdleState) -> Self {
        self.idle = Some(state);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl WindowStrategy for FakeWindowStrategy {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn display_server(&self) -> DisplayServerKind {
        DisplayServerKind::X11
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn try_get_focused_window(&self) -> Result<WindowInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(DetectionError::ToolUnavailable("fake".to_string()));
        }
        if let Some(queued) = self.queued.lock().pop_front() {
            return queued;
        }
        self.window
            .clone()
            .ok_or_else(|| DetectionError::NoFocusedWindow("fake".to_string()))
    }

    async fn get_idle_info(&self) -> Result<IdleState> {
        self.idle
            .ok_or_else(|| DetectionError::ToolUnavailable("fake idle".to_string()))
    }
}

/// Процессный путь с фиксированным ответом и счётчиками вызовов
pub struct CountingProcessDetector {
    result: Option<ActiveApplication>,
    calls: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl CountingProcessDetector {
    pub fn ok(app: ActiveApplication) -> Self {
        Self {
            result: Some(app),
            calls: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn err() -> Self {
        Self {
            result: None,
            calls: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn closes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

#[async_trait]
impl ProcessDetector for CountingProcessDetector {
    async fn detect(&self) -> Result<ActiveApplication> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or(DetectionError::NoGuiProcessDetected)
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Контекст детектора из подделок; по умолчанию ни утилит, ни процессов, ни шины
pub struct ContextBuilder {
    runner: Arc<dyn CommandRunner>,
    processes: Arc<dyn ProcessTable>,
    bus: Arc<dyn DesktopBus>,
    tools: Vec<String>,
    session: SessionEnv,
    config: DetectorConfig,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            runner: Arc::new(FakeRunner::new()),
            processes: Arc::new(FakeProcessTable::new()),
            bus: Arc::new(FakeBus::new()),
            tools: Vec::new(),
            session: SessionEnv::default(),
            config: DetectorConfig::default(),
        }
    }

    pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    pub fn processes(mut self, processes: impl ProcessTable + 'static) -> Self {
        self.processes = Arc::new(processes);
        self
    }

    pub fn bus(mut self, bus: impl DesktopBus + 'static) -> Self {
        self.bus = Arc::new(bus);
        self
    }

    pub fn tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|tool| tool.to_string()).collect();
        self
    }

    pub fn session(mut self, session: SessionEnv) -> Self {
        self.session = session;
        self
    }

    pub fn config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> DetectorContext {
        let tools: Vec<&str> = self.tools.iter().map(String::as_str).collect();
        DetectorContext {
            runner: self.runner,
            tools: Arc::new(ToolProbe::new(Box::new(FakeLookup::new(&tools)))),
            processes: self.processes,
            bus: self.bus,
            session: self.session,
            config: Arc::new(self.config),
        }
    }
}
