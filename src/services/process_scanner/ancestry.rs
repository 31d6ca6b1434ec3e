use super::table::ProcessTable;
use smallvec::SmallVec;
use std::sync::Arc;

/// Эмуляторы терминала (регистронезависимая подстрока командной строки)
pub const TERMINAL_EMULATORS: &[&str] = &[
    "terminator",
    "gnome-terminal",
    "konsole",
    "alacritty",
    "kitty",
    "tilix",
    "xterm",
    "rxvt",
    "wezterm",
    "foot",
    "xfce4-terminal",
    "ptyxis",
];

/// Защита от циклов в битой таблице процессов
const MAX_DEPTH: usize = 128;

pub type AncestorChain = SmallVec<[u32; 16]>;

/// Цепочка предков процесса детектора
pub struct AncestryScorer {
    table: Arc<dyn ProcessTable>,
    origin_pid: u32,
}

impl AncestryScorer {
    pub fn new(table: Arc<dyn ProcessTable>, origin_pid: u32) -> Self {
        Self { table, origin_pid }
    }

    /// Родители от ближайшего к PID 1, до PID 1 или ошибки чтения
    pub fn ancestors(&self) -> AncestorChain {
        let mut chain = AncestorChain::new();
        let mut pid = self.origin_pid;

        while pid > 1 && chain.len() < MAX_DEPTH {
            let Some(ppid) = self.table.parent_of(pid) else {
                break;
            };
            if ppid == 0 || chain.contains(&ppid) {
                break;
            }
            chain.push(ppid);
            pid = ppid;
        }

        chain
    }

    /// Первый предок, похожий на эмулятор терминала
    pub fn find_enclosing_terminal(&self) -> Option<u32> {
        self.ancestors().into_iter().find(|pid| {
            self.table
                .read(*pid)
                .map(|entry| is_terminal_command(&entry.cmdline))
                .unwrap_or(false)
        })
    }

    pub fn is_ancestor(&self, candidate_pid: u32) -> bool {
        self.ancestors().contains(&candidate_pid)
    }
}

pub fn is_terminal_command(cmdline: &str) -> bool {
    let lower = cmdline.to_lowercase();
    TERMINAL_EMULATORS.iter().any(|terminal| lower.contains(terminal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProcessTable;

    fn table() -> Arc<FakeProcessTable> {
        // systemd(1) -> gnome-terminal-server(100) -> bash(200) -> focuswatch(300)
        Arc::new(
            FakeProcessTable::new()
                .with(1, 0, "systemd", "/sbin/init", false)
                .with(100, 1, "gnome-terminal-", "/usr/libexec/gnome-terminal-server", true)
                .with(200, 100, "bash", "bash", true)
                .with(300, 200, "focuswatch", "focuswatch --once", true)
                .with(400, 1, "firefox", "/usr/lib/firefox/firefox", true),
        )
    }

    #[test]
    fn walks_up_to_init() {
        let scorer = AncestryScorer::new(table(), 300);
        assert_eq!(scorer.ancestors().as_slice(), &[200, 100, 1]);
        assert!(scorer.is_ancestor(200));
        assert!(scorer.is_ancestor(100));
        assert!(!scorer.is_ancestor(400));
        assert!(!scorer.is_ancestor(300));
    }

    #[test]
    fn finds_enclosing_terminal() {
        let scorer = AncestryScorer::new(table(), 300);
        assert_eq!(scorer.find_enclosing_terminal(), Some(100));

        let scorer = AncestryScorer::new(table(), 400);
        assert_eq!(scorer.find_enclosing_terminal(), None);
    }

    #[test]
    fn stops_on_read_failure_and_cycles() {
        // Родитель 50 отсутствует в таблице
        let broken = Arc::new(FakeProcessTable::new().with(10, 50, "app", "app", false));
        let scorer = AncestryScorer::new(broken, 10);
        assert_eq!(scorer.ancestors().as_slice(), &[50]);

        let cyclic = Arc::new(
            FakeProcessTable::new()
                .with(10, 20, "a", "a", false)
                .with(20, 10, "b", "b", false),
        );
        let scorer = AncestryScorer::new(cyclic, 10);
        assert_eq!(scorer.ancestors().as_slice(), &[20, 10]);
    }

    #[test]
    fn terminal_match_is_case_insensitive() {
        assert!(is_terminal_command("/usr/bin/Alacritty -e htop"));
        assert!(!is_terminal_command("/usr/bin/code"));
    }
}
