pub mod centrality;
pub mod complexity;
pub mod devrank;
pub mod traits;

pub use centrality::{CentralityAnalyzer, CentralityConfig, pagerank};
pub use complexity::ComplexityAnalyzer;
pub use devrank::{DevRankAnalyzer, DevRankReport};
pub use traits::Analyzer;
