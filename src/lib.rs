pub mod api;
pub mod collector;
pub mod cursor;
pub mod database;
pub mod models;
pub mod pivot;
pub mod reference;
pub mod translate;
pub mod ui;
