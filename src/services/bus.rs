//! Session/system D-Bus queries used by the GNOME strategy and the lock/idle probes.

use crate::error::{DetectionError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use zbus::{Connection, Proxy};

#[async_trait]
pub trait DesktopBus: Send + Sync {
    /// org.gnome.Shell.Eval: (успех, результат скрипта)
    async fn shell_eval(&self, script: &str) -> Result<(bool, String)>;

    /// org.gnome.ScreenSaver.GetActive
    async fn screensaver_active(&self) -> Result<bool>;

    /// LockedHint текущей сессии logind
    async fn session_locked_hint(&self) -> Result<bool>;

    /// org.gnome.Mutter.IdleMonitor: время простоя в мс
    async fn idle_time_ms(&self) -> Result<u64>;
}

/// Реализация на zbus. Подключения создаются лениво при первом запросе.
pub struct ZbusDesktopBus {
    session: OnceCell<Connection>,
    system: OnceCell<Connection>,
    timeout: Duration,
}

impl ZbusDesktopBus {
    pub fn new(timeout: Duration) -> Self {
        Self {
            session: OnceCell::new(),
            system: OnceCell::new(),
            timeout,
        }
    }

    async fn session(&self) -> Result<&Connection> {
        Ok(self.session.get_or_try_init(Connection::session).await?)
    }

    async fn system(&self) -> Result<&Connection> {
        Ok(self.system.get_or_try_init(Connection::system).await?)
    }

    async fn with_timeout<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| DetectionError::Timeout {
                command: format!("dbus {}", what),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }
}

#[async_trait]
impl DesktopBus for ZbusDesktopBus {
    async fn shell_eval(&self, script: &str) -> Result<(bool, String)> {
        self.with_timeout("org.gnome.Shell.Eval", async {
            let proxy = Proxy::new(
                self.session().await?,
                "org.gnome.Shell",
                "/org/gnome/Shell",
                "org.gnome.Shell",
            )
            .await?;
            let reply: (bool, String) = proxy.call("Eval", &(script,)).await?;
            Ok(reply)
        })
        .await
    }

    async fn screensaver_active(&self) -> Result<bool> {
        self.with_timeout("org.gnome.ScreenSaver.GetActive", async {
            let proxy = Proxy::new(
                self.session().await?,
                "org.gnome.ScreenSaver",
                "/org/gnome/ScreenSaver",
                "org.gnome.ScreenSaver",
            )
            .await?;
            let active: bool = proxy.call("GetActive", &()).await?;
            Ok(active)
        })
        .await
    }

    async fn session_locked_hint(&self) -> Result<bool> {
        self.with_timeout("login1 LockedHint", async {
            let proxy = Proxy::new(
                self.system().await?,
                "org.freedesktop.login1",
                "/org/freedesktop/login1/session/auto",
                "org.freedesktop.login1.Session",
            )
            .await?;
            let locked = proxy
                .get_property::<bool>("LockedHint")
                .await
                .map_err(zbus::Error::from)?;
            Ok(locked)
        })
        .await
    }

    async fn idle_time_ms(&self) -> Result<u64> {
        self.with_timeout("org.gnome.Mutter.IdleMonitor.GetIdletime", async {
            let proxy = Proxy::new(
                self.session().await?,
                "org.gnome.Mutter.IdleMonitor",
                "/org/gnome/Mutter/IdleMonitor/Core",
                "org.gnome.Mutter.IdleMonitor",
            )
            .await?;
            let idle: u64 = proxy.call("GetIdletime", &()).await?;
            Ok(idle)
        })
        .await
    }
}
