pub mod embedding;
pub mod realtime;
