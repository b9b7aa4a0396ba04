pub mod activity_log;
pub mod auth;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grade;
pub mod mailer;
pub mod name_generator;
pub mod payment;
pub mod query;
pub mod receipt;
pub mod record;
pub mod reminder;
pub mod rng;
pub mod sink;
pub mod store;
pub mod term;
pub mod transaction;
pub mod types;
pub mod users;
pub mod view_state;

pub use config::ConsoleConfig;
pub use dataset::{Console, Datasets};
pub use error::{ConsoleError, ConsoleResult};
pub use record::{Record, RecordSet};
pub use view_state::{Selection, ViewState};
