use super::table::ProcessEntry;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Распространённые GUI приложения (подстрока comm или командной строки)
pub const GUI_APPS: &[&str] = &[
    // Браузеры
    "firefox", "chrome", "chromium", "google-chrome", "brave", "opera", "vivaldi", "microsoft-edge",
    // Редакторы
    "code", "vscode", "sublime_text", "atom", "gedit", "vim", "nvim", "emacs",
    // Терминалы
    "gnome-terminal", "konsole", "terminator", "alacritty", "kitty", "wezterm", "tilix",
    // Общение
    "slack", "discord", "telegram", "signal", "zoom", "teams",
    // Офис
    "libreoffice", "soffice.bin", "writer", "calc", "impress",
    // Медиа
    "vlc", "mpv", "spotify", "rhythmbox", "totem",
    // Файловые менеджеры
    "nautilus", "dolphin", "thunar", "nemo", "caja",
    // IDE
    "idea", "pycharm", "webstorm", "eclipse", "netbeans",
];

/// Заведомо не GUI: оболочки, шины, аудио, агенты ключей
pub const NON_GUI_PROCESSES: &[&str] = &[
    // Оболочки
    "sh", "bash", "zsh", "fish", "dash", "ksh", "tcsh", "csh",
    // Сессия и шина
    "systemd", "dbus-daemon", "dbus-broker", "dbus-broker-lau", "dbus-launch",
    "at-spi-bus-launcher", "at-spi2-registryd", "xdg-desktop-portal", "xdg-document-portal",
    "xdg-permission-store", "gvfsd",
    // Аудио
    "pulseaudio", "pipewire", "pipewire-pulse", "wireplumber",
    // Агенты
    "gnome-keyring-daemon", "ssh-agent", "gpg-agent",
];

static DENYLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| NON_GUI_PROCESSES.iter().copied().collect());

/// По какому признаку процесс признан GUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiClassification {
    /// Имя из списка GUI приложений и не из denylist
    KnownApp,
    /// DISPLAY/WAYLAND_DISPLAY в окружении; denylist здесь не применяется
    DisplayEnvironment,
    NotGui,
}

impl GuiClassification {
    pub fn is_gui(self) -> bool {
        !matches!(self, GuiClassification::NotGui)
    }
}

pub fn classify(entry: &ProcessEntry) -> GuiClassification {
    if !is_denied(entry) && matches_known_app(entry) {
        return GuiClassification::KnownApp;
    }
    if entry.has_display_env {
        return GuiClassification::DisplayEnvironment;
    }
    GuiClassification::NotGui
}

pub fn matches_known_app(entry: &ProcessEntry) -> bool {
    GUI_APPS
        .iter()
        .any(|app| entry.comm.contains(app) || entry.cmdline.contains(app))
}

/// По comm или по имени исполняемого файла из командной строки
pub fn is_denied(entry: &ProcessEntry) -> bool {
    if DENYLIST.contains(entry.comm.as_str()) {
        return true;
    }
    let Some(program) = entry.cmdline.split_whitespace().next() else {
        return false;
    };
    let program = program.rsplit('/').next().unwrap_or(program);
    // Login shell: "-bash"
    DENYLIST.contains(program.trim_start_matches('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(comm: &str, cmdline: &str, display: bool) -> ProcessEntry {
        ProcessEntry {
            pid: 100,
            ppid: 1,
            comm: comm.to_string(),
            cmdline: cmdline.to_string(),
            has_display_env: display,
        }
    }

    #[test]
    fn known_apps_are_gui() {
        assert_eq!(
            classify(&entry("firefox", "/usr/lib/firefox/firefox", false)),
            GuiClassification::KnownApp
        );
        // Совпадение только по командной строке
        assert_eq!(
            classify(&entry("electron", "/opt/slack/slack --enable-features", false)),
            GuiClassification::KnownApp
        );
    }

    #[test]
    fn daemons_without_display_are_not_gui() {
        assert_eq!(classify(&entry("bash", "/bin/bash", false)), GuiClassification::NotGui);
        assert_eq!(classify(&entry("bash", "-bash", false)), GuiClassification::NotGui);
        assert_eq!(classify(&entry("pipewire", "/usr/bin/pipewire", false)), GuiClassification::NotGui);
        assert_eq!(classify(&entry("kworker/0:1", "", false)), GuiClassification::NotGui);
    }

    #[test]
    fn denylist_beats_allowlist_on_name_path() {
        // "vim" встречается в командной строке, но процесс - оболочка
        let shell = entry("bash", "bash -c vim notes.txt", false);
        assert!(matches_known_app(&shell));
        assert!(is_denied(&shell));
        assert_eq!(classify(&shell), GuiClassification::NotGui);
    }

    #[test]
    fn display_environment_ignores_denylist() {
        // Асимметрия: окружение сессии делает оболочку кандидатом
        assert_eq!(
            classify(&entry("bash", "/bin/bash", true)),
            GuiClassification::DisplayEnvironment
        );
        assert_eq!(
            classify(&entry("myapp", "/opt/myapp/myapp", true)),
            GuiClassification::DisplayEnvironment
        );
        assert!(GuiClassification::DisplayEnvironment.is_gui());
        assert!(!GuiClassification::NotGui.is_gui());
    }
}
