pub mod loading;
pub mod models;
