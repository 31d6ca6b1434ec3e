use super::{normalize_field, WindowInfo, UNKNOWN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Откуда получен результат
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayServerKind {
    X11,
    Wayland,
    ProcessBased,
}

impl fmt::Display for DisplayServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayServerKind::X11 => write!(f, "x11"),
            DisplayServerKind::Wayland => write!(f, "wayland"),
            DisplayServerKind::ProcessBased => write!(f, "process-based"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Window,
    Process,
    Hybrid,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::Window => write!(f, "window"),
            DetectionMethod::Process => write!(f, "process"),
            DetectionMethod::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Результат одного опроса. Создаётся заново на каждый вызов и отдаётся по значению.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveApplication {
    pub application_name: String,
    pub window_title: String,
    pub process_name: String,
    pub process_id: Option<u32>,
    pub display_server: DisplayServerKind,
    /// Для процессного пути это сырой ранговый счёт и может быть больше 1.0
    pub confidence: f64,
    pub detection_method: DetectionMethod,
    pub observed_at: DateTime<Utc>,
}

impl ActiveApplication {
    /// Окно найдено стратегией: максимальная уверенность
    pub fn from_window(window: &WindowInfo) -> Self {
        Self {
            application_name: window.app_name.clone(),
            window_title: window.title.clone(),
            process_name: window.process_name.clone(),
            process_id: window.pid,
            display_server: window.display_server,
            confidence: 1.0,
            detection_method: DetectionMethod::Window,
            observed_at: Utc::now(),
        }
    }

    pub fn from_process(command_name: &str, pid: u32, window_title: &str, score: f64) -> Self {
        let name = normalize_field(command_name);
        Self {
            application_name: name.clone(),
            window_title: normalize_field(window_title),
            process_name: name,
            process_id: Some(pid),
            display_server: DisplayServerKind::ProcessBased,
            confidence: score,
            detection_method: DetectionMethod::Process,
            observed_at: Utc::now(),
        }
    }

    /// Совпадает ли процессный результат с окном (по имени приложения или процесса)
    pub fn matches_window(&self, window: &WindowInfo) -> bool {
        let same = |a: &str, b: &str| a != UNKNOWN && a.eq_ignore_ascii_case(b);
        same(&self.application_name, &window.app_name)
            || same(&self.process_name, &window.process_name)
    }

    /// Подмешать заголовок окна к процессному результату; display_server остаётся processBased
    pub fn merge_window(&mut self, window: &WindowInfo) {
        self.window_title = window.title.clone();
        self.confidence = 0.9;
        self.detection_method = DetectionMethod::Hybrid;
    }
}

impl fmt::Display for ActiveApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - \"{}\" [{}, {}, {:.2}]",
            self.application_name,
            self.window_title,
            self.detection_method,
            self.display_server,
            self.confidence
        )
    }
}
