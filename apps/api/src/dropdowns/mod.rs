// Reference-data (dropdown) tables: tenant-scoped replace-all and option reads.
// Every storage access goes through `DropdownStore`; handlers only talk to
// `DropdownService`.

pub mod errors;
pub mod handlers;
pub mod import;
pub mod pg;
pub mod reader;
pub mod records;
pub mod service;
pub mod store;
pub mod sync;
pub mod tables;
pub mod tenant;

#[cfg(test)]
pub mod memory;

pub use errors::DropdownError;
pub use service::DropdownService;
pub use tenant::TenantScope;
