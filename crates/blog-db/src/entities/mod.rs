//! Database entities

pub mod comment;
pub mod post;
pub mod user;

pub use comment::Entity as Comment;
pub use post::Entity as Post;
pub use user::Entity as User;

pub mod prelude {
    pub use super::comment::Entity as Comment;
    pub use super::post::Entity as Post;
    pub use super::user::Entity as User;
}
