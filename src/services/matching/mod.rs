pub mod assignment;
pub mod normalizer;
pub mod resolver;
pub mod similarity;
