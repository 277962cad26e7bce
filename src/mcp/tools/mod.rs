//! MCP Tools
//!
//! One module per ERP area. Each handler maps tool arguments to a
//! [`TinyClient`](crate::erp::TinyClient) operation and returns the raw ERP
//! response.

pub mod contacts;
pub mod crm;
pub mod finance;
pub mod integrations;
pub mod inventory;
pub mod invoices;
pub mod logistics;
pub mod orders;
pub mod products;
pub mod reports;

use super::registry::HandlerTable;

/// Register every tool handler.
pub fn register_all_tools(handlers: &mut HandlerTable) {
    orders::register_tools(handlers);
    products::register_tools(handlers);
    contacts::register_tools(handlers);
    invoices::register_tools(handlers);
    finance::register_tools(handlers);
    crm::register_tools(handlers);
    logistics::register_tools(handlers);
    reports::register_tools(handlers);
    inventory::register_tools(handlers);
    integrations::register_tools(handlers);
}
