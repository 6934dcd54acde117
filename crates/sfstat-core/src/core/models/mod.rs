pub mod frame;
pub mod metadata;
pub mod site;
