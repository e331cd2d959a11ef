//! `SeaORM` entity definitions for the billing schema.

pub mod contract_lines;
pub mod contract_runs;
pub mod contracts;
pub mod customers;
pub mod document_sequences;
pub mod items;
pub mod payment_terms;
pub mod sales_document_lines;
pub mod sales_documents;
