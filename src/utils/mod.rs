pub mod image_helper;
pub mod solutions_table;
