use super::lock::LockProbe;
use super::r#trait::WindowStrategy;
use crate::detect_error;
use crate::error::Result;
use crate::events::{DisplayServerKind, IdleState, WindowInfo, UNKNOWN};
use crate::services::context::DetectorContext;
use serde::Deserialize;

/// Ответ `hyprctl activewindow -j`; при отсутствии фокуса - `{}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActiveWindow {
    class: Option<String>,
    title: Option<String>,
    pid: Option<i64>,
}

pub struct HyprlandStrategy {
    ctx: DetectorContext,
    lock: LockProbe,
}

impl HyprlandStrategy {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            lock: LockProbe::new(ctx.clone()),
            ctx,
        }
    }
}

#[async_trait::async_trait]
impl WindowStrategy for HyprlandStrategy {
    fn name(&self) -> &'static str {
        "hyprland"
    }

    fn display_server(&self) -> DisplayServerKind {
        DisplayServerKind::Wayland
    }

    fn is_available(&self) -> bool {
        self.ctx.has_tool("hyprctl")
    }

    async fn try_get_focused_window(&self) -> Result<WindowInfo> {
        let output = self.ctx.runner.stdout("hyprctl", &["activewindow", "-j"]).await?;
        let active: ActiveWindow = serde_json::from_str(&output)
            .map_err(|e| detect_error!(internal, "hyprctl вернул не JSON: {}", e))?;

        if active.class.is_none() && active.title.is_none() && active.pid.is_none() {
            return Err(detect_error!(no_focused_window, "Hyprland: нет окна в фокусе"));
        }

        let mut window = WindowInfo::new(
            active.class.as_deref().unwrap_or(UNKNOWN),
            active.title.as_deref().unwrap_or(UNKNOWN),
            DisplayServerKind::Wayland,
        );

        // -1 у окон без клиента
        if let Some(pid) = active.pid.and_then(|pid| u32::try_from(pid).ok()) {
            if let Some(process_name) = self.ctx.process_name(pid).await {
                window = window.with_process_name(&process_name);
            }
            window = window.with_pid(pid);
        }
        Ok(window)
    }

    async fn get_idle_info(&self) -> Result<IdleState> {
        let locked = self.lock.is_locked(DisplayServerKind::Wayland).await;
        Ok(IdleState::new(0, locked, self.ctx.config.idle_threshold_secs))
    }
}
