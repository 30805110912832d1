pub mod container;
pub mod serializer;
