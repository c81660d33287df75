//! Integration tests against a real store and mocked upstreams

mod price_history;
mod reference_directory;
mod statement_pipeline;
