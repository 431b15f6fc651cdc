// Core modules
pub mod persistence;
pub mod template;
pub mod template_map;
