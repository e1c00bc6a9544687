//! Integration tests

mod test_catalog;
mod test_http;
mod test_manager;
