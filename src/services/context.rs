use crate::config::DetectorConfig;
use crate::services::bus::{DesktopBus, ZbusDesktopBus};
use crate::services::command::{CommandRunner, SystemCommandRunner};
use crate::services::process_scanner::{ProcessTable, ProcfsTable};
use crate::services::tools::ToolProbe;
use std::sync::Arc;

/// Переменные окружения графической сессии, снятые один раз
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnv {
    pub wayland_display: Option<String>,
    pub session_type: Option<String>,
    pub display: Option<String>,
    pub current_desktop: Option<String>,
}

impl SessionEnv {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            wayland_display: var("WAYLAND_DISPLAY"),
            session_type: var("XDG_SESSION_TYPE"),
            display: var("DISPLAY"),
            current_desktop: var("XDG_CURRENT_DESKTOP"),
        }
    }

    pub fn is_wayland(&self) -> bool {
        self.wayland_display.is_some() || self.session_type.as_deref() == Some("wayland")
    }

    /// Есть X-дисплей (настоящий X11 или мост XWayland)
    pub fn has_x_display(&self) -> bool {
        self.display.is_some()
    }
}

/// Общие зависимости всех стратегий детектора
#[derive(Clone)]
pub struct DetectorContext {
    pub runner: Arc<dyn CommandRunner>,
    pub tools: Arc<ToolProbe>,
    pub processes: Arc<dyn ProcessTable>,
    pub bus: Arc<dyn DesktopBus>,
    pub session: SessionEnv,
    pub config: Arc<DetectorConfig>,
}

impl DetectorContext {
    pub fn system(config: &DetectorConfig) -> Self {
        Self {
            runner: Arc::new(SystemCommandRunner::new(config.command_timeout())),
            tools: Arc::new(ToolProbe::system()),
            processes: Arc::new(ProcfsTable),
            bus: Arc::new(ZbusDesktopBus::new(config.command_timeout())),
            session: SessionEnv::from_env(),
            config: Arc::new(config.clone()),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.is_tool_available(name)
    }

    /// Имя процесса по PID: таблица процессов, затем `ps -p <pid> -o comm=`
    pub async fn process_name(&self, pid: u32) -> Option<String> {
        if let Some(entry) = self.processes.read(pid) {
            if !entry.comm.is_empty() {
                return Some(entry.comm);
            }
        }

        if !self.has_tool("ps") {
            return None;
        }
        let pid = pid.to_string();
        self.runner
            .stdout("ps", &["-p", &pid, "-o", "comm="])
            .await
            .ok()
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ContextBuilder, FakeProcessTable, FakeRunner};

    #[test]
    fn wayland_detection_from_env() {
        let env = SessionEnv {
            session_type: Some("wayland".into()),
            ..Default::default()
        };
        assert!(env.is_wayland());
        assert!(!env.has_x_display());

        let env = SessionEnv {
            display: Some(":0".into()),
            session_type: Some("x11".into()),
            ..Default::default()
        };
        assert!(!env.is_wayland());
        assert!(env.has_x_display());
    }

    #[tokio::test]
    async fn process_name_prefers_table_then_ps() {
        let table = FakeProcessTable::new().with(500, 1, "kitty", "kitty", true);
        let runner = FakeRunner::new().ok("ps -p 777 -o comm=", "firefox\n");
        let ctx = ContextBuilder::new()
            .runner(runner)
            .processes(table)
            .tools(&["ps"])
            .build();

        assert_eq!(ctx.process_name(500).await.as_deref(), Some("kitty"));
        assert_eq!(ctx.process_name(777).await.as_deref(), Some("firefox"));
        assert_eq!(ctx.process_name(778).await, None);
    }
}
