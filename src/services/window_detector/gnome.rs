use super::lock::LockProbe;
use super::r#trait::WindowStrategy;
use super::xprop::{format_window_id, parse_active_window_id, parse_wm_class, parse_xprop_string};
use crate::detect_error;
use crate::error::Result;
use crate::events::{is_unknown, DisplayServerKind, IdleState, WindowInfo, UNKNOWN};
use crate::services::context::DetectorContext;
use tracing::debug;

const FOCUS_SCRIPT: &str = r#"
try {
    let win = global.get_window_actors().find(w => w.meta_window && w.meta_window.has_focus());
    if (win && win.meta_window) {
        let wm_class = win.meta_window.get_wm_class() || 'Unknown';
        let title = win.meta_window.get_title() || 'Unknown';
        wm_class + '|||' + title;
    } else {
        'Unknown|||Unknown';
    }
} catch (e) {
    'Unknown|||Unknown';
}
"#;

const SEPARATOR: &str = "|||";

/// GNOME Shell: Shell.Eval, затем мост XWayland через xprop
pub struct GnomeStrategy {
    ctx: DetectorContext,
    lock: LockProbe,
}

/// Ответ Eval: `class|||title`, возможно в JSON-кавычках
pub fn parse_eval_result(raw: &str) -> (String, String) {
    let raw = raw.trim();
    let unquoted = if raw.starts_with('"') {
        serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.trim_matches('"').to_string())
    } else {
        raw.trim_matches('\'').to_string()
    };

    match unquoted.split_once(SEPARATOR) {
        Some((class, title)) => (class.to_string(), title.to_string()),
        None => (unquoted, String::new()),
    }
}

impl GnomeStrategy {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            lock: LockProbe::new(ctx.clone()),
            ctx,
        }
    }

    async fn focused_via_shell(&self) -> Option<WindowInfo> {
        match self.ctx.bus.shell_eval(FOCUS_SCRIPT).await {
            Ok((true, raw)) => {
                let (class, title) = parse_eval_result(&raw);
                let window = WindowInfo::new(&class, &title, DisplayServerKind::Wayland);
                window.has_application().then_some(window)
            }
            Ok((false, _)) => {
                debug!("Shell.Eval заблокирован (нужен unsafe-mode)");
                None
            }
            Err(e) => {
                debug!("Shell.Eval недоступен: {}", e);
                None
            }
        }
    }

    /// Только для XWayland окон; нативная Wayland поверхность сюда не видна
    async fn focused_via_xwayland(&self) -> Result<WindowInfo> {
        if !self.ctx.has_tool("xprop") {
            return Err(detect_error!(tool_unavailable, "xprop"));
        }
        if !self.ctx.session.has_x_display() {
            return Err(detect_error!(no_focused_window, "DISPLAY не задан, мост XWayland недоступен"));
        }

        let active = self.ctx.runner.stdout("xprop", &["-root", "_NET_ACTIVE_WINDOW"]).await?;
        let Some(id) = parse_active_window_id(&active) else {
            debug!("XWayland: фокус у нативного Wayland окна");
            return Err(detect_error!(no_focused_window, "фокус у нативного Wayland окна"));
        };
        let id = format_window_id(id);

        let title = self
            .ctx
            .runner
            .stdout("xprop", &["-id", &id, "WM_NAME"])
            .await
            .map(|output| parse_xprop_string(&output))
            .unwrap_or_default();
        let class = self
            .ctx
            .runner
            .stdout("xprop", &["-id", &id, "WM_CLASS"])
            .await
            .map(|output| parse_wm_class(&output))
            .unwrap_or_default();

        let app_name = if is_unknown(&class) { UNKNOWN } else { class.as_str() };
        Ok(WindowInfo::new(app_name, &title, DisplayServerKind::Wayland))
    }
}

#[async_trait::async_trait]
impl WindowStrategy for GnomeStrategy {
    fn name(&self) -> &'static str {
        "gnome"
    }

    fn display_server(&self) -> DisplayServerKind {
        DisplayServerKind::Wayland
    }

    /// Шина проверяется только при запросе, поэтому стратегия доступна всегда
    fn is_available(&self) -> bool {
        true
    }

    async fn try_get_focused_window(&self) -> Result<WindowInfo> {
        if let Some(window) = self.focused_via_shell().await {
            return Ok(window);
        }
        self.focused_via_xwayland().await
    }

    async fn get_idle_info(&self) -> Result<IdleState> {
        let idle_ms = match self.ctx.bus.idle_time_ms().await {
            Ok(ms) => ms,
            Err(e) => {
                debug!("Mutter IdleMonitor недоступен: {}", e);
                0
            }
        };
        let locked = self.lock.is_locked(DisplayServerKind::Wayland).await;
        Ok(IdleState::new(idle_ms / 1000, locked, self.ctx.config.idle_threshold_secs))
    }
}
