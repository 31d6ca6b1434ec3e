//! Window strategies: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for finding the focused
//! window (application/title/process) and the idle/lock state of one display
//! server family. Strategy errors stay inside the strategy boundary: the resolver
//! treats any of them as "unavailable" and moves on to the process scanner.

mod compositor;
mod dry_run;
mod gnome;
mod hyprland;
mod kde;
mod lock;
mod sway;
mod x11;
pub mod xprop;
mod r#trait;

pub use self::compositor::{Compositor, COMPOSITOR_PRIORITY};
pub use self::dry_run::DryRunStrategy;
pub use self::gnome::GnomeStrategy;
pub use self::hyprland::HyprlandStrategy;
pub use self::kde::KdeStrategy;
pub use self::lock::{LockProbe, WAYLAND_LOCKERS, X11_LOCKERS};
pub use self::r#trait::WindowStrategy;
pub use self::sway::SwayStrategy;
pub use self::x11::X11Strategy;

use crate::services::context::DetectorContext;
use tracing::{info, warn};

/// Итог выбора при создании детектора
pub struct StrategySelection {
    pub strategy: Option<Box<dyn WindowStrategy>>,
    pub compositor: Option<Compositor>,
}

fn compositor_strategy(ctx: &DetectorContext, compositor: Compositor) -> Option<Box<dyn WindowStrategy>> {
    let strategy: Box<dyn WindowStrategy> = match compositor {
        Compositor::Sway => Box::new(SwayStrategy::new(ctx.clone())),
        Compositor::Hyprland => Box::new(HyprlandStrategy::new(ctx.clone())),
        Compositor::Gnome => Box::new(GnomeStrategy::new(ctx.clone())),
        Compositor::Kde => Box::new(KdeStrategy::new(ctx.clone())),
        Compositor::Wayfire | Compositor::River => return None,
    };
    Some(strategy)
}

/// Factory function: выбирает стратегию один раз по окружению и процессам
pub fn create_window_strategy(ctx: &DetectorContext, dry_run: bool) -> StrategySelection {
    if dry_run {
        return StrategySelection {
            strategy: Some(Box::new(DryRunStrategy::new(ctx.config.idle_threshold_secs))),
            compositor: None,
        };
    }

    let x11 = ctx
        .session
        .has_x_display()
        .then(|| X11Strategy::new(ctx.clone()))
        .filter(|strategy| strategy.is_available());

    if !ctx.session.is_wayland() {
        return match x11 {
            Some(strategy) => {
                info!("Используем стратегию X11");
                StrategySelection {
                    strategy: Some(Box::new(strategy)),
                    compositor: None,
                }
            }
            None => {
                warn!("Нет графической сессии или утилит X11, остаётся только скан процессов");
                StrategySelection {
                    strategy: None,
                    compositor: None,
                }
            }
        };
    }

    let compositor = Compositor::detect(ctx.processes.as_ref(), &ctx.session);
    let Some(detected) = compositor else {
        let strategy = match x11 {
            Some(x11) => {
                info!("Композитор Wayland не распознан, используем X11 через XWayland");
                Some(Box::new(x11) as Box<dyn WindowStrategy>)
            }
            None => {
                warn!("Композитор Wayland не распознан, окно определить нельзя");
                None
            }
        };
        return StrategySelection {
            strategy,
            compositor: None,
        };
    };
    info!("Обнаружен композитор: {}", detected);

    let strategy = compositor_strategy(ctx, detected);
    let strategy = match (strategy, x11) {
        (Some(strategy), _) if strategy.is_available() => Some(strategy),
        // Утилит композитора нет, но XWayland мост работает
        (_, Some(x11)) => {
            info!("Утилиты {} не найдены, используем X11 через XWayland", detected);
            Some(Box::new(x11) as Box<dyn WindowStrategy>)
        }
        (strategy, None) => {
            if !detected.has_strategy() {
                warn!("Для композитора {} нет стратегии", detected);
            } else {
                warn!("Утилиты {} недоступны, а XWayland мост не работает", detected);
            }
            strategy
        }
    };

    if let Some(strategy) = &strategy {
        info!("Используем стратегию {}", strategy.name());
    }

    StrategySelection {
        strategy,
        compositor: Some(detected),
    }
}
