pub mod item;
pub mod records;
