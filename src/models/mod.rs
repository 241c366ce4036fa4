pub mod analytics;
pub mod currency;
pub mod dashboard;
pub mod party;
pub mod project;
pub mod review;
pub mod wallet;

pub use analytics::*;
pub use currency::*;
pub use dashboard::*;
pub use party::*;
pub use project::*;
pub use review::*;
pub use wallet::*;
