//! # flight-search
//!
//! Drive the Goibibo flight search page: pick two cities and a date, submit,
//! and check that the results page lists flights. Each wait is bounded,
//! milestones are screenshotted and the run ends with a single pass/fail.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flight_search::{ChromeTransport, Config, FlightSearch};
//!
//! # #[tokio::main]
//! # async fn main() -> step_runner::Result<()> {
//! let config = Config::load("configs/delhi-mumbai.yaml")?;
//! let result = FlightSearch::new(config).run::<ChromeTransport>().await?;
//! println!("Success: {}", result.success());
//! # Ok(())
//! # }
//! ```

mod browser;
mod config;
mod error;
pub mod locators;
mod search;
pub mod steps;

pub use browser::{ChromeElement, ChromeTransport};
pub use config::{ArtifactConfig, BrowserConfig, Config, SearchParams, Timeouts};
pub use error::SearchError;
pub use search::FlightSearch;
