pub mod canned;
pub mod cleaner;
pub mod image_parsing;
