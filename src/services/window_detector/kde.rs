use super::lock::LockProbe;
use super::r#trait::WindowStrategy;
use crate::detect_error;
use crate::error::Result;
use crate::events::{DisplayServerKind, IdleState, WindowInfo};
use crate::services::context::DetectorContext;
use tracing::debug;

const ACTIVE_CLIENT_SCRIPT: &str = r#"
var clients = workspace.clientList();
for (var i = 0; i < clients.length; i++) {
    if (clients[i].active) {
        print(clients[i].resourceClass + "|" + clients[i].caption);
    }
}
"#;

/// KDE Plasma: скрипт KWin через qdbus, затем kdotool
pub struct KdeStrategy {
    ctx: DetectorContext,
    lock: LockProbe,
}

/// `class|caption`; голое число - это id загруженного скрипта, а не результат
pub fn parse_script_output(output: &str) -> Option<(String, String)> {
    let output = output.trim();
    if output.is_empty() || output.parse::<i64>().is_ok() {
        return None;
    }
    match output.split_once('|') {
        Some((class, caption)) => Some((class.to_string(), caption.to_string())),
        None => Some((output.to_string(), String::new())),
    }
}

impl KdeStrategy {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            lock: LockProbe::new(ctx.clone()),
            ctx,
        }
    }

    async fn focused_via_script(&self) -> Option<WindowInfo> {
        if !self.ctx.has_tool("qdbus") {
            return None;
        }

        let output = self
            .ctx
            .runner
            .stdout(
                "qdbus",
                &[
                    "org.kde.KWin",
                    "/Scripting",
                    "org.kde.kwin.Scripting.loadScript",
                    ACTIVE_CLIENT_SCRIPT,
                ],
            )
            .await;

        match output {
            Ok(output) => {
                let Some((class, caption)) = parse_script_output(&output) else {
                    debug!("KWin вернул id скрипта вместо окна: '{}'", output);
                    return None;
                };
                let window = WindowInfo::new(&class, &caption, DisplayServerKind::Wayland);
                window.has_application().then_some(window)
            }
            Err(e) => {
                debug!("Скрипт KWin не выполнен: {}", e);
                None
            }
        }
    }

    async fn focused_via_kdotool(&self) -> Result<WindowInfo> {
        if !self.ctx.has_tool("kdotool") {
            return Err(detect_error!(tool_unavailable, "kdotool"));
        }

        let window_id = self.ctx.runner.stdout("kdotool", &["getactivewindow"]).await?;
        if window_id.is_empty() {
            return Err(detect_error!(no_focused_window, "kdotool не вернул окно"));
        }

        let title = self
            .ctx
            .runner
            .stdout("kdotool", &["getwindowname", &window_id])
            .await
            .unwrap_or_default();
        let class = self
            .ctx
            .runner
            .stdout("kdotool", &["getwindowclassname", &window_id])
            .await
            .unwrap_or_default();

        Ok(WindowInfo::new(&class, &title, DisplayServerKind::Wayland))
    }
}

#[async_trait::async_trait]
impl WindowStrategy for KdeStrategy {
    fn name(&self) -> &'static str {
        "kde"
    }

    fn display_server(&self) -> DisplayServerKind {
        DisplayServerKind::Wayland
    }

    fn is_available(&self) -> bool {
        self.ctx.has_tool("qdbus") || self.ctx.has_tool("kdotool")
    }

    async fn try_get_focused_window(&self) -> Result<WindowInfo> {
        if let Some(window) = self.focused_via_script().await {
            return Ok(window);
        }
        self.focused_via_kdotool().await
    }

    async fn get_idle_info(&self) -> Result<IdleState> {
        let locked = self.lock.is_locked(DisplayServerKind::Wayland).await;
        Ok(IdleState::new(0, locked, self.ctx.config.idle_threshold_secs))
    }
}
