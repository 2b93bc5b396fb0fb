pub mod announcements;
pub mod assignments;
pub mod auth;
pub mod chat;
pub mod classes;
pub mod health;
pub mod submissions;
pub mod users;
