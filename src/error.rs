use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Утилита недоступна: {0}")]
    ToolUnavailable(String),

    #[error("Активное окно не найдено: {0}")]
    NoFocusedWindow(String),

    #[error("GUI приложения не обнаружены")]
    NoGuiProcessDetected,

    #[error("Все методы детекции не сработали (окно: {}, процессы: {process})", .window.as_deref().unwrap_or("нет стратегии"))]
    AllMethodsFailed {
        window: Option<String>,
        process: String,
    },

    #[error("Команда '{command}' завершилась с ошибкой: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Команда '{command}' не ответила за {timeout_ms}мс")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl DetectionError {
    /// Ошибки, которые означают лишь "стратегия сейчас недоступна"
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DetectionError::ToolUnavailable(_)
                | DetectionError::NoFocusedWindow(_)
                | DetectionError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DetectionError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! detect_error {
    (tool_unavailable, $($arg:tt)*) => {
        $crate::error::DetectionError::ToolUnavailable(format!($($arg)*))
    };
    (no_focused_window, $($arg:tt)*) => {
        $crate::error::DetectionError::NoFocusedWindow(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::DetectionError::Internal(format!($($arg)*))
    };
}
