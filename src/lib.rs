//! Определение активного приложения на Linux: окно в фокусе (X11, Wayland
//! композиторы) с откатом на ранжирование GUI процессов.

pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{DetectionError, Result};
pub use events::{ActiveApplication, DetectionMethod, DisplayServerKind, IdleState, WindowInfo};
pub use services::{DetectorStatus, HybridDetector};
