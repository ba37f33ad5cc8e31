use crate::application::balance::BalanceResult;
use crate::error::Result;
use std::io::Write;

/// Writes balance results as CSV, one header row followed by one row per
/// result.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_balance(&mut self, balance: &BalanceResult) -> Result<()> {
        self.writer.serialize(balance)?;
        self.writer.flush()?;
        Ok(())
    }
}
