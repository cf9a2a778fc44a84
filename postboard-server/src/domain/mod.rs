pub mod error;
pub mod id;
pub mod pagination;
pub mod post;
pub mod user;

pub use error::{DomainError, ErrorKind, PostAction};
pub use id::{PostId, UserId};
pub use pagination::{PageWindow, Pagination};
pub use post::Post;
pub use user::User;
