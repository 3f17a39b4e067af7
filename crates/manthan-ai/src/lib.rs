pub mod aspects;
pub mod classifier;
pub mod embedder;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use classifier::{LexiconClassifier, Prediction, SentimentModel};
pub use embedder::{Embedder, HashEmbedder, cosine_sim, normalize};
