mod fetch;
mod normalize;
mod pages;
mod patterns;
mod pipeline;
mod run;
mod section;
mod sink;
#[cfg(test)]
mod tests;
mod toc;

pub use patterns::CitationMatcher;
pub use run::run;
pub use sink::{citation_layout, clean_citation_rows};
