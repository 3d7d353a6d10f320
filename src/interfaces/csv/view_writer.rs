use crate::error::Result;
use crate::infrastructure::view::ViewEvent;
use std::io::Write;

/// Writes the recorded view log as `seq,op,detail` CSV.
pub struct ViewLogWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ViewLogWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_events(&mut self, events: &[ViewEvent]) -> Result<()> {
        for event in events {
            self.writer.serialize(event)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
