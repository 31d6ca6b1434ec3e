pub mod application;
pub mod idle;
pub mod window;

pub use application::{ActiveApplication, DetectionMethod, DisplayServerKind};
pub use idle::IdleState;
pub use window::WindowInfo;

/// Заглушка для неизвестных/пустых значений
pub const UNKNOWN: &str = "Unknown";

/// Привести пустые и заглушечные значения к `UNKNOWN`
pub fn normalize_field(value: &str) -> String {
    let trimmed = value.trim();
    match trimmed {
        "" | "null" | "(null)" | "undefined" | "Unknown" => UNKNOWN.to_string(),
        _ => trimmed.to_string(),
    }
}

pub fn is_unknown(value: &str) -> bool {
    normalize_field(value) == UNKNOWN
}
