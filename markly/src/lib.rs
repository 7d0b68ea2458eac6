mod app;
pub mod bookmarks;
pub mod cli;
pub mod logging;

pub use app::App;

// Always expose testing module (integration tests need it)
pub mod testing;
