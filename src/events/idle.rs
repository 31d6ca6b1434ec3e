use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 300;

/// Состояние простоя/блокировки системы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleState {
    pub is_idle: bool,
    pub is_locked: bool,
    pub idle_seconds: u64,
}

impl IdleState {
    /// Простой считается только при строгом превышении порога
    pub fn new(idle_seconds: u64, is_locked: bool, threshold_secs: u64) -> Self {
        Self {
            is_idle: idle_seconds > threshold_secs,
            is_locked,
            idle_seconds,
        }
    }

    /// Когда реальных данных о простое нет
    pub fn active(is_locked: bool) -> Self {
        Self {
            is_idle: false,
            is_locked,
            idle_seconds: 0,
        }
    }

    pub fn should_skip(&self) -> bool {
        self.is_idle || self.is_locked
    }
}

impl fmt::Display for IdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "idle={} locked={} ({}s)",
            self.is_idle, self.is_locked, self.idle_seconds
        )
    }
}
