use super::lock::LockProbe;
use super::r#trait::WindowStrategy;
use super::xprop::{parse_active_window_id, parse_wm_class, parse_window_id};
use crate::detect_error;
use crate::error::Result;
use crate::events::{is_unknown, DisplayServerKind, IdleState, WindowInfo, UNKNOWN};
use crate::services::context::DetectorContext;
use tracing::debug;

/// X11: xdotool, при его отсутствии wmctrl + xprop
pub struct X11Strategy {
    ctx: DetectorContext,
    lock: LockProbe,
}

impl X11Strategy {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            lock: LockProbe::new(ctx.clone()),
            ctx,
        }
    }

    /// Класс окна через xprop; пустая строка, если не вышло
    async fn window_class(&self, window_id: &str) -> String {
        if !self.ctx.has_tool("xprop") {
            return String::new();
        }
        match self.ctx.runner.stdout("xprop", &["-id", window_id, "WM_CLASS"]).await {
            Ok(output) => parse_wm_class(&output),
            Err(e) => {
                debug!("WM_CLASS для {} не прочитан: {}", window_id, e);
                String::new()
            }
        }
    }

    async fn resolve_identity(&self, window_id: &str, title: &str, pid: Option<u32>) -> WindowInfo {
        let class = self.window_class(window_id).await;
        let process_name = match pid {
            Some(pid) => self.ctx.process_name(pid).await.unwrap_or_default(),
            None => String::new(),
        };

        // Класс окна надёжнее имени процесса (sandbox приложения без PID)
        let app_name = if !is_unknown(&class) {
            class.as_str()
        } else if !is_unknown(&process_name) {
            process_name.as_str()
        } else {
            UNKNOWN
        };

        let mut window =
            WindowInfo::new(app_name, title, DisplayServerKind::X11).with_process_name(&process_name);
        if let Some(pid) = pid {
            window = window.with_pid(pid);
        }
        window
    }

    async fn focused_via_xdotool(&self) -> Result<WindowInfo> {
        let window_id = self.ctx.runner.stdout("xdotool", &["getactivewindow"]).await?;
        if window_id.is_empty() {
            return Err(detect_error!(no_focused_window, "xdotool не вернул окно"));
        }

        let title = self
            .ctx
            .runner
            .stdout("xdotool", &["getwindowname", &window_id])
            .await
            .unwrap_or_default();
        let pid = self
            .ctx
            .runner
            .stdout("xdotool", &["getwindowpid", &window_id])
            .await
            .ok()
            .and_then(|pid| pid.parse().ok());

        Ok(self.resolve_identity(&window_id, &title, pid).await)
    }

    async fn focused_via_wmctrl(&self) -> Result<WindowInfo> {
        if !self.ctx.has_tool("xprop") {
            return Err(detect_error!(tool_unavailable, "xprop"));
        }

        let active = self.ctx.runner.stdout("xprop", &["-root", "_NET_ACTIVE_WINDOW"]).await?;
        let Some(active_id) = parse_active_window_id(&active) else {
            return Err(detect_error!(no_focused_window, "_NET_ACTIVE_WINDOW пуст"));
        };

        let listing = self.ctx.runner.stdout("wmctrl", &["-l", "-p"]).await?;
        let Some(line) = listing
            .lines()
            .filter_map(parse_wmctrl_line)
            .find(|line| line.id == active_id)
        else {
            return Err(detect_error!(no_focused_window, "окно 0x{:x} не найдено в wmctrl", active_id));
        };

        Ok(self.resolve_identity(line.raw_id, line.title, line.pid).await)
    }
}

/// Строка `wmctrl -l -p`: `0x03a00007  0 4242   host Title words`
#[derive(Debug, PartialEq, Eq)]
struct WmctrlLine<'a> {
    raw_id: &'a str,
    id: u64,
    pid: Option<u32>,
    title: &'a str,
}

fn parse_wmctrl_line(line: &str) -> Option<WmctrlLine<'_>> {
    let mut rest = line.trim_start();
    let mut fields = [""; 4];
    for field in fields.iter_mut() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }

    let [raw_id, _desktop, pid, _host] = fields;
    let id = parse_window_id(raw_id)?;
    Some(WmctrlLine {
        raw_id,
        id,
        // 0 - PID неизвестен
        pid: pid.parse().ok().filter(|pid| *pid > 0),
        title: rest.trim_end(),
    })
}

#[async_trait::async_trait]
impl WindowStrategy for X11Strategy {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn display_server(&self) -> DisplayServerKind {
        DisplayServerKind::X11
    }

    fn is_available(&self) -> bool {
        self.ctx.has_tool("xdotool") || self.ctx.has_tool("wmctrl")
    }

    async fn try_get_focused_window(&self) -> Result<WindowInfo> {
        if self.ctx.has_tool("xdotool") {
            self.focused_via_xdotool().await
        } else if self.ctx.has_tool("wmctrl") {
            self.focused_via_wmctrl().await
        } else {
            Err(detect_error!(tool_unavailable, "xdotool/wmctrl"))
        }
    }

    async fn get_idle_info(&self) -> Result<IdleState> {
        let idle_ms = if self.ctx.has_tool("xprintidle") {
            self.ctx
                .runner
                .stdout("xprintidle", &[])
                .await
                .ok()
                .and_then(|ms| ms.parse::<u64>().ok())
                .unwrap_or(0)
        } else {
            0
        };

        let locked = self.lock.is_locked(DisplayServerKind::X11).await;
        Ok(IdleState::new(idle_ms / 1000, locked, self.ctx.config.idle_threshold_secs))
    }
}
