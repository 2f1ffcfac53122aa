pub mod config;
pub mod data_core;
pub mod inspect;
pub mod l8n;
pub mod node_view;
pub mod performance;
pub mod xml_doc;
