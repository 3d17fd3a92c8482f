//! Inference service implementations

mod bedrock;
mod factory;

pub use bedrock::{
    BedrockConverseClient, BedrockInferenceClient, ConverseCall, ConverseClientTrait,
};
pub use factory::InferenceClientFactory;
