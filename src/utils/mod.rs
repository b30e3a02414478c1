pub mod clock;
pub mod logger;
