pub mod script_reader;
pub mod view_writer;
