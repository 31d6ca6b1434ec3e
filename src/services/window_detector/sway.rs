use super::lock::LockProbe;
use super::r#trait::WindowStrategy;
use crate::detect_error;
use crate::error::Result;
use crate::events::{DisplayServerKind, IdleState, WindowInfo, UNKNOWN};
use crate::services::context::DetectorContext;
use serde_json::Value;

/// Sway: дерево из `swaymsg -t get_tree`
pub struct SwayStrategy {
    ctx: DetectorContext,
    lock: LockProbe,
}

impl SwayStrategy {
    pub fn new(ctx: DetectorContext) -> Self {
        Self {
            lock: LockProbe::new(ctx.clone()),
            ctx,
        }
    }
}

/// Окно, а не контейнер или workspace
fn is_window_node(node: &Value) -> bool {
    node.get("app_id").is_some_and(|v| !v.is_null())
        || node.pointer("/window_properties/class").is_some()
        || node.get("pid").and_then(Value::as_u64).is_some()
}

/// Поиск в глубину узла с `"focused": true`
pub fn find_focused_node(node: &Value) -> Option<&Value> {
    if node.get("focused").and_then(Value::as_bool) == Some(true) && is_window_node(node) {
        return Some(node);
    }

    ["nodes", "floating_nodes"]
        .iter()
        .filter_map(|key| node.get(key).and_then(Value::as_array))
        .flatten()
        .find_map(find_focused_node)
}

fn string_field<'a>(node: &'a Value, pointer: &str) -> Option<&'a str> {
    node.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

#[async_trait::async_trait]
impl WindowStrategy for SwayStrategy {
    fn name(&self) -> &'static str {
        "sway"
    }

    fn display_server(&self) -> DisplayServerKind {
        DisplayServerKind::Wayland
    }

    fn is_available(&self) -> bool {
        self.ctx.has_tool("swaymsg")
    }

    async fn try_get_focused_window(&self) -> Result<WindowInfo> {
        let output = self.ctx.runner.stdout("swaymsg", &["-t", "get_tree"]).await?;
        let tree: Value = serde_json::from_str(&output)
            .map_err(|e| detect_error!(internal, "swaymsg вернул не JSON: {}", e))?;

        let Some(node) = find_focused_node(&tree) else {
            return Err(detect_error!(no_focused_window, "в дереве sway нет окна в фокусе"));
        };

        // XWayland окна вместо app_id несут window_properties.class
        let app_name = string_field(node, "/app_id")
            .or_else(|| string_field(node, "/window_properties/class"))
            .unwrap_or(UNKNOWN);
        let title = string_field(node, "/name").unwrap_or(UNKNOWN);
        let pid = node
            .get("pid")
            .and_then(Value::as_u64)
            .and_then(|pid| u32::try_from(pid).ok());

        let mut window = WindowInfo::new(app_name, title, DisplayServerKind::Wayland);
        if let Some(pid) = pid {
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
