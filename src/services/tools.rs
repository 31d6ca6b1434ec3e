use parking_lot::RwLock;
use std::collections::HashMap;
use std::ffi::OsString;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Утилиты, которые проверяются один раз при создании детектора
pub const KNOWN_TOOLS: &[&str] = &[
    "xdotool",
    "xprop",
    "xprintidle",
    "wmctrl",
    "swaymsg",
    "hyprctl",
    "qdbus",
    "kdotool",
    "ps",
];

/// Поиск исполняемого файла по имени
pub trait PathLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<PathBuf>;
}

/// Поиск по $PATH, снятому в момент создания
pub struct EnvPathLookup {
    path: Option<OsString>,
}

impl EnvPathLookup {
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os("PATH"),
        }
    }

    fn is_executable(path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
}

impl PathLookup for EnvPathLookup {
    fn lookup(&self, name: &str) -> Option<PathBuf> {
        if name.contains('/') {
            let path = PathBuf::from(name);
            return Self::is_executable(&path).then_some(path);
        }

        let path = self.path.as_ref()?;
        std::env::split_paths(path)
            .map(|dir| dir.join(name))
            .find(|candidate| Self::is_executable(candidate))
    }
}

/// Кэш наличия утилит. Заполняется при создании, дальше только чтение.
pub struct ToolProbe {
    lookup: Box<dyn PathLookup>,
    cache: RwLock<HashMap<String, bool>>,
}

impl ToolProbe {
    pub fn new(lookup: Box<dyn PathLookup>) -> Self {
        let probe = Self {
            lookup,
            cache: RwLock::new(HashMap::new()),
        };
        for tool in KNOWN_TOOLS {
            probe.is_tool_available(tool);
        }
        debug!("Доступные утилиты: {:?}", probe.available_tools());
        probe
    }

    pub fn system() -> Self {
        Self::new(Box::new(EnvPathLookup::from_env()))
    }

    /// Утилиты вне KNOWN_TOOLS ищутся при первом запросе и тоже кэшируются
    pub fn is_tool_available(&self, name: &str) -> bool {
        if let Some(found) = self.cache.read().get(name) {
            return *found;
        }

        let found = self.lookup.lookup(name).is_some();
        self.cache.write().insert(name.to_string(), found);
        found
    }

    pub fn available_tools(&self) -> Vec<String> {
        let mut tools: Vec<String> = self
            .cache
            .read()
            .iter()
            .filter(|(_, found)| **found)
            .map(|(name, _)| name.clone())
            .collect();
        tools.sort();
        tools
    }
}
