pub mod assign_ids;
pub mod check_urls;
pub mod citations;
pub mod clean_citations;
mod components;
pub mod executive_orders;
pub mod recommend;
pub mod scrub;
