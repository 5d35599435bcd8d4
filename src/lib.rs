pub mod command;
pub mod index;
pub mod logic;
pub mod model;
pub mod parser;
pub mod storage;
