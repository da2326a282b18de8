pub mod arxiv_search;
pub mod blog_writer;
pub mod prompt_builder;
pub mod ranking;
pub mod scholar_search;
pub mod search_service;

pub use arxiv_search::ArxivSearch;
pub use blog_writer::BlogWriter;
pub use ranking::RelevanceRanker;
pub use scholar_search::ScholarSearch;
pub use search_service::{SearchProvider, SearchRegistry};
