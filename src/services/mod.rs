pub mod business_lookup;
pub mod description_enricher;
pub mod directory_walker;
pub mod openai_client;
pub mod page_fetcher;
pub mod pipeline;
pub mod places_client;
pub mod worker_pool;

pub use business_lookup::*;
pub use description_enricher::*;
pub use directory_walker::*;
pub use openai_client::*;
pub use page_fetcher::*;
pub use pipeline::*;
pub use places_client::*;
pub use worker_pool::*;
