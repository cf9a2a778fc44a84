pub mod auth_service;
pub mod post_service;

pub use auth_service::AuthService;
pub use post_service::{ListPostsQuery, PostService};
