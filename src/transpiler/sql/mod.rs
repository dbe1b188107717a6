pub mod canonical;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
