use super::{is_unknown, normalize_field, DisplayServerKind, UNKNOWN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Информация об окне в фокусе, как её видит стратегия
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub app_name: String,
    pub title: String,
    pub process_name: String,
    pub pid: Option<u32>,
    pub display_server: DisplayServerKind,
}

impl WindowInfo {
    /// Пустые и заглушечные значения сразу нормализуются в "Unknown"
    pub fn new(app_name: &str, title: &str, display_server: DisplayServerKind) -> Self {
        let app_name = normalize_field(app_name);
        Self {
            process_name: app_name.clone(),
            app_name,
            title: normalize_field(title),
            pid: None,
            display_server,
        }
    }

    /// Имя процесса; при пустом значении остаётся app_name
    pub fn with_process_name(mut self, process_name: &str) -> Self {
        if !is_unknown(process_name) {
            self.process_name = normalize_field(process_name);
        }
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Окно пригодно как результат: имя приложения известно
    pub fn has_application(&self) -> bool {
        !is_unknown(&self.app_name)
    }
}

impl Default for WindowInfo {
    fn default() -> Self {
        Self::new(UNKNOWN, UNKNOWN, DisplayServerKind::ProcessBased)
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.title, self.app_name)
    }
}
