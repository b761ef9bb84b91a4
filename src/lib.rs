// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod error;
pub mod host_info;
pub mod maintenance;
pub mod models;
pub mod query;
pub mod reader;
pub mod routes;
pub mod store;
pub mod validator;
