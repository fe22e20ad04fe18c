//! Core XML parsing primitives
//!
//! The fundamental building blocks the cursor is made of:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: pull-based XML token extraction
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - Attributes: attribute parsing and extraction

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
