use crate::events::DisplayServerKind;
use crate::services::context::DetectorContext;
use tracing::debug;

/// Процессы экранных блокировщиков X11
pub const X11_LOCKERS: &[&str] = &[
    "gnome-screensaver-dialog",
    "kscreenlocker_greet",
    "i3lock",
    "slock",
    "xscreensaver",
    "xsecurelock",
    "light-locker",
];

pub const WAYLAND_LOCKERS: &[&str] = &[
    "swaylock",
    "waylock",
    "gtklock",
    "hyprlock",
    "gnome-screensaver-dialog",
    "kscreenlocker_greet",
];

/// Эвристика блокировки экрана: живой процесс блокировщика, на Wayland ещё и подсказки D-Bus
#[derive(Clone)]
pub struct LockProbe {
    ctx: DetectorContext,
}

impl LockProbe {
    pub fn new(ctx: DetectorContext) -> Self {
        Self { ctx }
    }

    pub async fn is_locked(&self, kind: DisplayServerKind) -> bool {
        match kind {
            DisplayServerKind::X11 => self.locker_running(X11_LOCKERS),
            DisplayServerKind::Wayland => {
                self.locker_running(WAYLAND_LOCKERS) || self.bus_reports_locked().await
            }
            DisplayServerKind::ProcessBased => {
                self.locker_running(X11_LOCKERS)
                    || self.locker_running(WAYLAND_LOCKERS)
                    || self.bus_reports_locked().await
            }
        }
    }

    fn locker_running(&self, lockers: &[&str]) -> bool {
        self.ctx.processes.any_process_named(lockers)
    }

    async fn bus_reports_locked(&self) -> bool {
        match self.ctx.bus.session_locked_hint().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => debug!("LockedHint недоступен: {}", e),
        }

        match self.ctx.bus.screensaver_active().await {
            Ok(active) => active,
            Err(e) => {
                debug!("ScreenSaver.GetActive недоступен: {}", e);
                false
            }
        }
    }
}
