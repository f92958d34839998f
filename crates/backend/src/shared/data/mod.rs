pub mod columns;
pub mod db;
