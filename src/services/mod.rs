pub mod bus;
pub mod command;
pub mod context;
pub mod process_scanner;
pub mod resolver;
pub mod tools;
pub mod window_detector;

pub use context::{DetectorContext, SessionEnv};
pub use resolver::{DetectorStatus, HybridDetector};
pub use window_detector::create_window_strategy;
