pub mod client;

pub use client::DiscordWebhook;
