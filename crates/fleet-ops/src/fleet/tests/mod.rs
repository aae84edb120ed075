mod common;

mod dashboard;
mod fetch;
