use crate::error::{DetectionError, Result};
use std::ffi::OsStr;
use std::path::Path;

/// Ядро обрезает comm до 15 байт
pub const COMM_MAX_LEN: usize = 15;

/// Снимок одной записи таблицы процессов
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub ppid: u32,
    /// Короткое имя (comm)
    pub comm: String,
    /// Полная командная строка, аргументы через пробел
    pub cmdline: String,
    /// В окружении есть DISPLAY или WAYLAND_DISPLAY
    pub has_display_env: bool,
}

pub trait ProcessTable: Send + Sync {
    /// Интерфейс таблицы процессов существует на этой ОС
    fn is_available(&self) -> bool;

    fn pids(&self) -> Result<Vec<u32>>;

    /// None, если процесс исчез или не читается
    fn read(&self, pid: u32) -> Option<ProcessEntry>;

    fn entries(&self) -> Result<Vec<ProcessEntry>> {
        Ok(self.pids()?.into_iter().filter_map(|pid| self.read(pid)).collect())
    }

    fn parent_of(&self, pid: u32) -> Option<u32> {
        self.read(pid).map(|entry| entry.ppid)
    }

    /// Жив ли хоть один процесс с одним из имён (аналог `pgrep -x`)
    fn any_process_named(&self, names: &[&str]) -> bool {
        let Ok(entries) = self.entries() else {
            return false;
        };
        entries
            .iter()
            .any(|entry| names.iter().any(|name| entry_matches(entry, name)))
    }
}

/// Имя первого аргумента командной строки без пути
pub fn executable_name(cmdline: &str) -> Option<&str> {
    let program = cmdline.split_whitespace().next()?;
    Path::new(program).file_name().and_then(OsStr::to_str)
}

/// Совпадение процесса с полным именем. Обрезанный comm неоднозначен
/// (`gnome-screensav` у демона и у `gnome-screensaver-dialog`), поэтому
/// длинное имя подтверждается по cmdline.
pub fn entry_matches(entry: &ProcessEntry, name: &str) -> bool {
    if entry.comm == name {
        return true;
    }
    if !comm_matches(&entry.comm, name) {
        return false;
    }
    match executable_name(&entry.cmdline) {
        Some(executable) => executable == name,
        // cmdline не прочитан - остаётся только comm
        None => true,
    }
}

/// Сравнение comm с полным именем с учётом обрезки ядром. Для имён длиннее
/// 15 байт совпадение только возможное, см. `entry_matches`.
pub fn comm_matches(comm: &str, name: &str) -> bool {
    if comm == name {
        return true;
    }
    if name.len() <= COMM_MAX_LEN {
        return false;
    }
    let mut end = COMM_MAX_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    comm == &name[..end]
}

/// /proc через procfs
pub struct ProcfsTable;

impl ProcessTable for ProcfsTable {
    fn is_available(&self) -> bool {
        Path::new("/proc/self/stat").exists()
    }

    fn pids(&self) -> Result<Vec<u32>> {
        let processes = procfs::process::all_processes()
            .map_err(|e| DetectionError::Internal(format!("Не удалось прочитать /proc: {}", e)))?;
        Ok(processes
            .filter_map(|process| process.ok())
            .filter_map(|process| u32::try_from(process.pid).ok())
            .collect())
    }

    fn read(&self, pid: u32) -> Option<ProcessEntry> {
        let process = procfs::process::Process::new(i32::try_from(pid).ok()?).ok()?;
        let stat = process.stat().ok()?;

        let cmdline = process
            .cmdline()
            .map(|args| args.join(" "))
            .unwrap_or_default();

        // Чужие процессы обычно не дают читать environ
        let has_display_env = process
            .environ()
            .map(|environ| {
                environ.contains_key(OsStr::new("DISPLAY"))
                    || environ.contains_key(OsStr::new("WAYLAND_DISPLAY"))
            })
            .unwrap_or(false);

        Some(ProcessEntry {
            pid,
            ppid: u32::try_from(stat.ppid).unwrap_or(0),
            comm: stat.comm,
            cmdline,
            has_display_env,
        })
    }
}
