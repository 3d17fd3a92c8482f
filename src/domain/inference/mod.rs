//! Inference service domain models and traits

mod client;
mod request;

pub use client::{InferenceClient, TextStream};
pub use request::{DocumentPayload, InferenceRequest, InferenceRequestBuilder};

#[cfg(test)]
pub use client::mock::MockInferenceClient;
