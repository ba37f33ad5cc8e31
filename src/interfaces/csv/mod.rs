pub mod balance_writer;
pub mod importer;
pub mod record_reader;
