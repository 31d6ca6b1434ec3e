use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub detector: DetectorConfig,
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

/// Параметры самого детектора (все значения - для одного экземпляра)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Таймаут на каждый вызов внешней утилиты
    pub command_timeout_ms: u64,
    pub idle_threshold_secs: u64,
    /// Сколько живёт запись кандидата без повторного наблюдения
    pub candidate_ttl_secs: u64,
    /// Сколько живёт отметка CPU-активности
    pub activity_ttl_secs: u64,
    pub sampler_interval_ms: u64,
    pub sampler_top_n: usize,
    pub sampler_cpu_threshold: f64,
    /// Искать заголовок окна для процесса через xprop
    pub title_lookup: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    pub poll_interval_secs: u64,
    pub skip_idle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
                filter: "focuswatch=info".to_string(),
            },
            detector: DetectorConfig::default(),
            tracker: TrackerConfig {
                poll_interval_secs: 10,
                skip_idle: true,
            },
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 2000,
            idle_threshold_secs: 300,
            candidate_ttl_secs: 5,
            activity_ttl_secs: 30,
            sampler_interval_ms: 1000,
            sampler_top_n: 10,
            sampler_cpu_threshold: 0.5,
            title_lookup: true,
        }
    }
}

/// Нижняя граница периода CPU сэмплера
pub const MIN_SAMPLER_INTERVAL_MS: u64 = 100;

impl DetectorConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn candidate_ttl(&self) -> Duration {
        Duration::from_secs(self.candidate_ttl_secs)
    }

    pub fn activity_ttl(&self) -> Duration {
        Duration::from_secs(self.activity_ttl_secs)
    }

    /// Не меньше MIN_SAMPLER_INTERVAL_MS, даже если конфигурация не валидировалась
    pub fn sampler_interval(&self) -> Duration {
        Duration::from_millis(self.sampler_interval_ms.max(MIN_SAMPLER_INTERVAL_MS))
    }
}

impl Config {
    /// Значения по умолчанию, затем TOML (если файл есть), затем FOCUSWATCH_*
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let config: Config = Self::figment(config_path)
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("FOCUSWATCH_").split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация детектора
        let detector = &self.detector;
        if !(100..=30_000).contains(&detector.command_timeout_ms) {
            anyhow::bail!(
                "command_timeout_ms должно быть в диапазоне 100..=30000, получено {}",
                detector.command_timeout_ms
            );
        }

        if detector.candidate_ttl_secs == 0 || detector.activity_ttl_secs == 0 {
            anyhow::bail!("candidate_ttl_secs и activity_ttl_secs должны быть больше 0");
        }

        if detector.sampler_interval_ms < MIN_SAMPLER_INTERVAL_MS {
            anyhow::bail!("sampler_interval_ms должно быть минимум {}", MIN_SAMPLER_INTERVAL_MS);
        }

        if detector.sampler_top_n == 0 {
            anyhow::bail!("sampler_top_n должно быть больше 0");
        }

        if !detector.sampler_cpu_threshold.is_finite() || detector.sampler_cpu_threshold < 0.0 {
            anyhow::bail!(
                "Неверный порог CPU: {}",
                detector.sampler_cpu_threshold
            );
        }

        // Валидация трекера
        if !(10..=300).contains(&self.tracker.poll_interval_secs) {
            anyhow::bail!(
                "poll_interval_secs должно быть в диапазоне 10..=300, получено {}",
                self.tracker.poll_interval_secs
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.idle_threshold_secs, 300);
        assert_eq!(config.tracker.poll_interval_secs, 10);
    }

    #[test]
    fn test_poll_interval_bounds() {
        let mut config = Config::default();
        config.tracker.poll_interval_secs = 9;
        assert!(config.validate().is_err());

        config.tracker.poll_interval_secs = 300;
        assert!(config.validate().is_ok());

        config.tracker.poll_interval_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_command_timeout_bounds() {
        let mut config = Config::default();
        config.detector.command_timeout_ms = 50;
        assert!(config.validate().is_err());

        config.detector.command_timeout_ms = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_merges_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "focuswatch.toml",
                r#"
                [tracker]
                poll_interval_secs = 30

                [detector]
                command_timeout_ms = 500
                "#,
            )?;
            jail.set_env("FOCUSWATCH_DETECTOR__IDLE_THRESHOLD_SECS", "120");

            let config = Config::load("focuswatch.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.tracker.poll_interval_secs, 30);
            assert_eq!(config.detector.command_timeout_ms, 500);
            assert_eq!(config.detector.idle_threshold_secs, 120);
            // Не указанное в файле берётся из значений по умолчанию
            assert_eq!(config.detector.sampler_top_n, 10);
            Ok(())
        });
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load("missing.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.detector.candidate_ttl_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn test_sampler_interval_is_clamped() {
        let detector = DetectorConfig {
            sampler_interval_ms: 0,
            ..DetectorConfig::default()
        };
        assert_eq!(
            detector.sampler_interval(),
            Duration::from_millis(MIN_SAMPLER_INTERVAL_MS)
        );

        let config = Config {
            detector,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.create_file("focuswatch.toml", "[tracker]\npoll_interval_secs = 5\n")?;
            assert!(Config::load("focuswatch.toml").is_err());
            Ok(())
        });
    }
}
