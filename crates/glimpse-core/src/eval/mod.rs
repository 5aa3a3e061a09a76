//! Caption quality metrics.

pub mod bleu;

pub use bleu::{sentence_bleu, sentence_bleu_text, BleuScore};
