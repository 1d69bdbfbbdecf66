mod api_tests;
mod common;
mod email_tests;
