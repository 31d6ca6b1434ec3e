use crate::error::{DetectionError, Result};
use crate::trace_if_enabled;
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

/// Утилиты сессии, которые под sudo нужно запускать от имени SUDO_USER
const SESSION_TOOLS: &[&str] = &["kdotool", "qdbus"];

/// Захваченный вывод внешней команды
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Запуск внешних утилит. Любой вызов - точка ожидания для вызывающего.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Обрезанный stdout успешной команды; ненулевой код выхода - ошибка
    async fn stdout(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = self.run(program, args).await?;
        if !output.success {
            return Err(DetectionError::CommandFailed {
                command: describe(program, args),
                message: format!(
                    "код {}: {}",
                    output.code.unwrap_or(-1),
                    output.stderr.trim()
                ),
            });
        }
        Ok(output.stdout.trim().to_string())
    }
}

pub fn describe(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Реальный запуск через tokio::process с таймаутом на каждый вызов
pub struct SystemCommandRunner {
    timeout: Duration,
    sudo_user: Option<String>,
    /// Окружение сессии SUDO_USER, заполняется при первом запуске утилиты сессии
    session_env: OnceCell<HashMap<String, String>>,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sudo_user: sudo_user(),
            session_env: OnceCell::new(),
        }
    }

    async fn create_command(&self, program: &str, args: &[&str]) -> Command {
        let mut cmd = match &self.sudo_user {
            Some(user) if SESSION_TOOLS.contains(&program) => {
                let env = self
                    .session_env
                    .get_or_init(|| session_env_for(user, self.timeout))
                    .await;

                let mut cmd = Command::new("sudo");
                cmd.args(["-E", "-u", user.as_str(), program]);
                cmd.envs(env);
                cmd
            }
            _ => Command::new(program),
        };
        cmd.args(args);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let command = describe(program, args);
        trace_if_enabled!("Запуск: {}", command);
        let mut cmd = self.create_command(program, args).await;

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                debug!("'{}' не ответила за {:?}", command, self.timeout);
                Err(DetectionError::Timeout {
                    command,
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("'{}' не найдена: {}", program, e);
                Err(DetectionError::ToolUnavailable(program.to_string()))
            }
            Ok(Err(e)) => Err(DetectionError::Io(e)),
            Ok(Ok(output)) => Ok(output.into()),
        }
    }
}

fn sudo_user() -> Option<String> {
    if std::env::var("USER").unwrap_or_default() != "root" {
        return None;
    }
    std::env::var("SUDO_USER").ok().filter(|user| !user.is_empty())
}

/// Переменные сессии пользователя с данным uid
fn session_env(user: &str, uid: &str) -> HashMap<String, String> {
    let runtime_dir = format!("/run/user/{}", uid);
    HashMap::from([
        (
            "DBUS_SESSION_BUS_ADDRESS".to_string(),
            format!("unix:path={}/bus", runtime_dir),
        ),
        ("XDG_RUNTIME_DIR".to_string(), runtime_dir),
        ("USER".to_string(), user.to_string()),
    ])
}

/// uid через `id -u`; без ответа подстановок нет
async fn session_env_for(user: &str, timeout: Duration) -> HashMap<String, String> {
    let mut cmd = Command::new("id");
    cmd.args(["-u", user]).stdin(Stdio::null()).kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => output,
        Ok(Ok(_)) | Ok(Err(_)) | Err(_) => {
            debug!("Не удалось узнать uid пользователя {}", user);
            return HashMap::new();
        }
    };

    let uid = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if uid.is_empty() {
        return HashMap::new();
    }
    debug!("Окружение сессии пользователя {}: uid={}", user, uid);
    session_env(user, &uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_env_points_at_user_bus() {
        let env = session_env("alice", "1000");
        assert_eq!(env["DBUS_SESSION_BUS_ADDRESS"], "unix:path=/run/user/1000/bus");
        assert_eq!(env["XDG_RUNTIME_DIR"], "/run/user/1000");
        assert_eq!(env["USER"], "alice");
    }

    #[tokio::test]
    async fn session_env_of_missing_user_is_empty() {
        let env = session_env_for("focuswatch-no-such-user", Duration::from_secs(2)).await;
        assert!(env.is_empty());
    }

    #[test]
    fn describe_joins_args() {
        assert_eq!(describe("xdotool", &["getactivewindow"]), "xdotool getactivewindow");
        assert_eq!(describe("ps", &[]), "ps");
    }

    #[tokio::test]
    async fn missing_tool_is_unavailable() {
        let runner = SystemCommandRunner::new(Duration::from_secs(2));
        let err = runner
            .run("focuswatch-definitely-missing-tool", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::ToolUnavailable(_)));
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let runner = SystemCommandRunner::new(Duration::from_millis(100));
        let err = runner.run("sleep", &["5"]).await.unwrap_err();
        assert!(matches!(err, DetectionError::Timeout { timeout_ms: 100, .. }));
    }

    #[tokio::test]
    async fn stdout_is_trimmed_and_failures_reported() {
        let runner = SystemCommandRunner::new(Duration::from_secs(2));
        assert_eq!(runner.stdout("echo", &["  focus  "]).await.unwrap(), "focus");

        let err = runner.stdout("false", &[]).await.unwrap_err();
        assert!(matches!(err, DetectionError::CommandFailed { .. }));
        assert!(runner.run("true", &[]).await.unwrap().success);
    }
}
