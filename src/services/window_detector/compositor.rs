use crate::services::context::SessionEnv;
use crate::services::process_scanner::ProcessTable;
use serde::Serialize;
use std::fmt;

/// Wayland композиторы, которые умеем распознать
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compositor {
    Sway,
    Hyprland,
    Gnome,
    Kde,
    /// Распознаётся, но стратегии нет
    Wayfire,
    River,
}

/// Порядок поиска: первый найденный процесс побеждает
pub const COMPOSITOR_PRIORITY: &[(Compositor, &str)] = &[
    (Compositor::Sway, "sway"),
    (Compositor::Hyprland, "Hyprland"),
    (Compositor::Gnome, "gnome-shell"),
    (Compositor::Kde, "kwin_wayland"),
    (Compositor::Wayfire, "wayfire"),
    (Compositor::River, "river"),
];

impl Compositor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compositor::Sway => "sway",
            Compositor::Hyprland => "hyprland",
            Compositor::Gnome => "gnome",
            Compositor::Kde => "kde",
            Compositor::Wayfire => "wayfire",
            Compositor::River => "river",
        }
    }

    pub fn has_strategy(&self) -> bool {
        !matches!(self, Compositor::Wayfire | Compositor::River)
    }

    /// По таблице процессов, затем по XDG_CURRENT_DESKTOP
    pub fn detect(processes: &dyn ProcessTable, session: &SessionEnv) -> Option<Self> {
        let by_process = COMPOSITOR_PRIORITY
            .iter()
            .find(|(_, process)| processes.any_process_named(&[*process]))
            .map(|(compositor, _)| *compositor);

        by_process.or_else(|| {
            session
                .current_desktop
                .as_deref()
                .and_then(Self::from_desktop_name)
        })
    }

    /// XDG_CURRENT_DESKTOP бывает списком через ':' (`ubuntu:GNOME`)
    fn from_desktop_name(desktop: &str) -> Option<Self> {
        let desktop = desktop.to_lowercase();
        desktop.split(':').find_map(|name| match name {
            "sway" => Some(Compositor::Sway),
            "hyprland" => Some(Compositor::Hyprland),
            "gnome" => Some(Compositor::Gnome),
            "kde" => Some(Compositor::Kde),
            "wayfire" => Some(Compositor::Wayfire),
            "river" => Some(Compositor::River),
            _ => None,
        })
    }
}

impl fmt::Display for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProcessTable;

    #[test]
    fn priority_order_wins() {
        // XWayland сессия с обоими процессами: sway раньше gnome-shell
        let table = FakeProcessTable::new()
            .with(10, 1, "gnome-shell", "/usr/bin/gnome-shell", true)
            .with(11, 1, "sway", "sway", true);
        assert_eq!(Compositor::detect(&table, &SessionEnv::default()), Some(Compositor::Sway));

        let table = FakeProcessTable::new().with(10, 1, "kwin_wayland", "/usr/bin/kwin_wayland", true);
        assert_eq!(Compositor::detect(&table, &SessionEnv::default()), Some(Compositor::Kde));
    }

    #[test]
    fn desktop_env_fallback() {
        let session = SessionEnv {
            current_desktop: Some("ubuntu:GNOME".into()),
            ..Default::default()
        };
        assert_eq!(
            Compositor::detect(&FakeProcessTable::new(), &session),
            Some(Compositor::Gnome)
        );
        assert_eq!(Compositor::detect(&FakeProcessTable::new(), &SessionEnv::default()), None);
    }

    #[test]
    fn wayfire_has_no_strategy() {
        let table = FakeProcessTable::new().with(10, 1, "wayfire", "wayfire", true);
        let compositor = Compositor::detect(&table, &SessionEnv::default()).unwrap();
        assert_eq!(compositor.to_string(), "wayfire");
        assert!(!compositor.has_strategy());
    }
}
