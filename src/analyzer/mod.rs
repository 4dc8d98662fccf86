pub mod client;

pub use client::AnalyzerClient;
