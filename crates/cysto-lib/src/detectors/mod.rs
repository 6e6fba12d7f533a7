pub mod empty;
pub mod landmarks;
pub mod peaks;
pub mod threshold;
