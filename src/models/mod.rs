pub mod attempt;
pub mod candidate;
pub mod coding;
pub mod identity;
pub mod mcq;
pub mod resume;
pub mod video;
