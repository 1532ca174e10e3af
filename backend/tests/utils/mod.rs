pub mod db;
pub mod seeds;
