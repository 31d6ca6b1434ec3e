use crate::error::Result;
use crate::events::{DisplayServerKind, IdleState, WindowInfo};

/// Стратегия определения окна в фокусе для одного семейства дисплейных серверов
#[async_trait::async_trait]
pub trait WindowStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn display_server(&self) -> DisplayServerKind;

    /// Нужные утилиты на месте. Проверка по кэшу, без запуска команд.
    fn is_available(&self) -> bool;

    async fn try_get_focused_window(&self) -> Result<WindowInfo>;

    /// Простой и блокировка экрана с точки зрения этого семейства
    async fn get_idle_info(&self) -> Result<IdleState>;

    async fn close(&self) {}
}
