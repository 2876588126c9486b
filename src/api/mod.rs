pub mod client;

pub use client::ScavengerClient;
