pub mod auth;
pub mod health;
pub mod users;

pub use auth::{login, logout, signup};
pub use health::health_check;
pub use users::{delete_user, profile, update_profile};
