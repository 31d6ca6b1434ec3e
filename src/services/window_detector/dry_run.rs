use super::r#trait::WindowStrategy;
use crate::error::Result;
use crate::events::{DisplayServerKind, IdleState, WindowInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const FAKE_WINDOWS: &[(&str, &str)] = &[
    ("gnome-terminal", "Terminal - dry_run"),
    ("firefox", "Browser - dry_run"),
    ("code", "Editor - dry_run"),
    ("steam", "Game - dry_run"),
];

/// Эмуляция: по кругу отдаёт фиктивные окна, ничего не запускает
pub struct DryRunStrategy {
    index: AtomicUsize,
    idle_threshold_secs: u64,
}

impl DryRunStrategy {
    pub fn new(idle_threshold_secs: u64) -> Self {
        info!("Dry-run режим - детектор окон работает в режиме эмуляции");
        Self {
            index: AtomicUsize::new(0),
            idle_threshold_secs,
        }
    }
}

#[async_trait::async_trait]
impl WindowStrategy for DryRunStrategy {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn display_server(&self) -> DisplayServerKind {
        DisplayServerKind::X11
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn try_get_focused_window(&self) -> Result<WindowInfo> {
        let index = self.index.fetch_add(1, Ordering::Relaxed) % FAKE_WINDOWS.len();
        let (app, title) = FAKE_WINDOWS[index];
        info!("Dry-run: эмулируем окно {}", title);
        Ok(WindowInfo::new(app, title, DisplayServerKind::X11).with_pid(1000 + index as u32))
    }

    async fn get_idle_info(&self) -> Result<IdleState> {
        Ok(IdleState::new(0, false, self.idle_threshold_secs))
    }
}
