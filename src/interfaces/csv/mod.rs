pub mod payment_reader;
pub mod settlement_writer;
