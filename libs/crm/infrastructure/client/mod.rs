//! Backend API clients

pub mod webhook;

pub use webhook::{
    AuthResponse, Endpoint, Webhook, WebhookClient, WebhookEndpoints, WebhookError,
    WebhookRequest,
};
