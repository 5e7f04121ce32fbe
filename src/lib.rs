// Library surface for the binary, headless runs and integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod export;
pub mod history;
pub mod mode;
pub mod question_bank;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod util;

pub use controller::SessionController;
pub use mode::GameMode;
pub use session::{GameSession, SessionResult, SessionStatus};
