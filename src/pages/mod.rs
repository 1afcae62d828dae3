pub mod login;
pub mod profile;
pub mod settings;
pub mod todo;
