//! Query understanding and first-pass scoring for Assessa.
//!
//! # Modules
//!
//! - [`text`]: Normalization and whole-word phrase matching
//! - [`lexicon`]: Synonym, role and cue tables
//! - [`duration`]: Duration bound extraction
//! - [`analyzer`]: Query signals and expansion text
//! - [`hybrid`]: Semantic + lexical scoring
//! - [`filter`]: Soft duration and category penalties

pub mod analyzer;
pub mod duration;
pub mod filter;
pub mod hybrid;
pub mod lexicon;
pub mod text;

pub use analyzer::QueryAnalyzer;
pub use duration::extract_duration;
pub use filter::SoftFilter;
pub use hybrid::{HybridScorer, LexicalEvidence};
pub use text::{Tokens, normalize_text, tokenize};
