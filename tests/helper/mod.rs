mod http;
mod source;

pub use http::{get, get_text};
pub use source::{create_test_app, unreachable_url};
