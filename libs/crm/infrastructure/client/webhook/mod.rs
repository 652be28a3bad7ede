pub mod client;
pub mod types;

pub use client::{
    decode_list, decode_single, Webhook, WebhookClient, WebhookEndpoints, WebhookError,
};
pub use types::{AuthResponse, Endpoint, WebhookRequest};
