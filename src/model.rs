pub mod registry;
pub mod space;
pub mod tree;
pub mod window;
