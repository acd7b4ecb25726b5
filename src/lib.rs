pub mod api;
pub mod configuration;
pub mod domain;
pub mod error;
pub mod github_client;
pub mod handlers;
pub mod schema;
pub mod startup;
pub mod zulip_client;

pub use api::*;
pub use configuration::*;
pub use domain::*;
pub use error::*;
pub use github_client::*;
pub use handlers::*;
pub use startup::*;
pub use zulip_client::*;
