use crate::events::{normalize_field, UNKNOWN};
use crate::services::context::DetectorContext;
use crate::services::window_detector::xprop::{
    format_window_id, parse_client_list, parse_wm_pid, parse_xprop_string,
};
use tracing::debug;

/// Сколько окон из _NET_CLIENT_LIST проверяем за один поиск
pub const MAX_CLIENT_WINDOWS: usize = 64;

/// Заголовок окна, принадлежащего PID. Без xprop или DISPLAY - "Unknown".
pub async fn title_for_pid(ctx: &DetectorContext, pid: u32) -> String {
    if !ctx.config.title_lookup || !ctx.has_tool("xprop") || !ctx.session.has_x_display() {
        return UNKNOWN.to_string();
    }

    let clients = match ctx.runner.stdout("xprop", &["-root", "_NET_CLIENT_LIST"]).await {
        Ok(output) => parse_client_list(&output),
        Err(e) => {
            debug!("Не удалось получить список окон: {}", e);
            return UNKNOWN.to_string();
        }
    };

    for id in clients.into_iter().take(MAX_CLIENT_WINDOWS) {
        let id = format_window_id(id);
        let Ok(output) = ctx.runner.stdout("xprop", &["-id", &id, "_NET_WM_PID"]).await else {
            continue;
        };
        if parse_wm_pid(&output) != Some(pid) {
            continue;
        }

        return match ctx.runner.stdout("xprop", &["-id", &id, "WM_NAME"]).await {
            Ok(output) => normalize_field(&parse_xprop_string(&output)),
            Err(_) => UNKNOWN.to_string(),
        };
    }

    UNKNOWN.to_string()
}
