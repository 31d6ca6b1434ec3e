use anyhow::Result;
use clap::Parser;
use focuswatch::config::{Config, LoggingConfig};
use focuswatch::utils::truncate_display;
use focuswatch::HybridDetector;
use tokio::signal;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "focuswatch")]
#[command(about = "Определение активного приложения на Linux (X11, Wayland, процессы)")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "focuswatch.toml")]
    config: String,

    /// Режим сухого запуска (фиктивные окна вместо реальных утилит)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает конфигурацию)
    #[arg(long)]
    log_level: Option<String>,

    /// Один опрос и выход
    #[arg(long)]
    once: bool,

    /// Напечатать состояние детектора в JSON и выйти
    #[arg(long)]
    status: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
        config.validate()?;
    }

    // Инициализация системы логирования
    init_tracing(&config.logging)?;

    info!("Запуск focuswatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - окна эмулируются");
    }

    let detector = HybridDetector::new(&config.detector, args.dry_run);

    if args.status {
        println!("{}", serde_json::to_string_pretty(&detector.status())?);
        detector.close().await;
        return Ok(());
    }

    if !detector.is_available() {
        error!("Ни окно, ни таблица процессов недоступны");
    }

    if args.once {
        poll_once(&detector, &config).await;
        detector.close().await;
        return Ok(());
    }

    let mut ticker = interval(Duration::from_secs(config.tracker.poll_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Опрос каждые {} с", config.tracker.poll_interval_secs);

    loop {
        tokio::select! {
            _ = ticker.tick() => poll_once(&detector, &config).await,
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                break;
            }
        }
    }

    info!("Завершение работы...");
    detector.close().await;
    info!("focuswatch завершил работу");
    Ok(())
}

/// Один цикл опроса; ошибки только логируются
async fn poll_once(detector: &HybridDetector, config: &Config) {
    let idle = detector.get_idle_info().await;
    debug!("Состояние простоя: {}", idle);

    if config.tracker.skip_idle && idle.should_skip() {
        info!("Пропуск опроса: {}", idle);
        return;
    }

    match detector.get_active_application().await {
        Ok(app) => info!(
            app = %app.application_name,
            process = %app.process_name,
            pid = ?app.process_id,
            method = %app.detection_method,
            confidence = app.confidence,
            "Активное приложение: {}",
            truncate_display(&app.window_title, 80)
        ),
        Err(e) => warn!("Не удалось определить активное приложение: {}", e),
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directives = if logging.filter.is_empty() {
        logging.level.clone()
    } else {
        format!("{},{}", logging.level, logging.filter)
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directives))?;

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format.as_str() {
        "pretty" => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
    }

    Ok(())
}
