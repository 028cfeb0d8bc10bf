//! HTTP response construction shared by variant handlers and the admin API.

mod builder;

pub use builder::{
    build_response, build_response_with_headers, error_response, json_response, not_found,
    ResponseBuilder,
};
