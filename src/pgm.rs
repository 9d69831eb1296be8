use std::io::{self, BufWriter, Write};

use crate::byteorder::WriteBytesBe;

/// Binary PGM (P5) writer for 16-bit samples.
///
/// Samples wider than 8 bits are stored big-endian, two bytes each.
pub struct PgmWriter<W: Write> {
    writer: BufWriter<W>,
    width: usize,
    height: usize,
    max_value: u16,
    samples_written: usize,
    row_buffer: Vec<u8>,
}

impl<W: Write> PgmWriter<W> {
    pub fn new(writer: W, width: usize, height: usize, max_value: u16) -> Self {
        Self {
            writer: BufWriter::new(writer),
            width,
            height,
            max_value,
            samples_written: 0,
            row_buffer: Vec::with_capacity(width * 2),
        }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        write!(
            self.writer,
            "P5\n{} {}\n{}\n",
            self.width, self.height, self.max_value
        )
    }

    pub fn write_row(&mut self, row: &[u16]) -> io::Result<()> {
        if self.samples_written + row.len() > self.width * self.height {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "More samples than the image holds",
            ));
        }

        self.row_buffer.clear();
        row.write_be(&mut self.row_buffer);
        self.writer.write_all(&self.row_buffer)?;
        self.samples_written += row.len();
        Ok(())
    }

    /// Flushes the output; fails if the image is incomplete.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.samples_written != self.width * self.height {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Wrote {} of {} samples",
                    self.samples_written,
                    self.width * self.height
                ),
            ));
        }

        self.writer.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_and_big_endian_samples() -> io::Result<()> {
        let mut writer = PgmWriter::new(Cursor::new(Vec::new()), 2, 2, 1023);
        writer.write_header()?;
        writer.write_row(&[612, 475])?;
        writer.write_row(&[0, 1023])?;
        writer.finish()?;

        let buffer = writer.into_inner()?.into_inner();
        let header = b"P5\n2 2\n1023\n";
        assert_eq!(&buffer[..header.len()], header);
        assert_eq!(
            &buffer[header.len()..],
            &[0x02, 0x64, 0x01, 0xdb, 0x00, 0x00, 0x03, 0xff]
        );
        Ok(())
    }

    #[test]
    fn sample_count_must_match() -> io::Result<()> {
        let mut writer = PgmWriter::new(Cursor::new(Vec::new()), 2, 1, 4095);
        writer.write_header()?;
        assert!(writer.write_row(&[1, 2, 3]).is_err());
        writer.write_row(&[1])?;
        assert!(writer.finish().is_err());
        Ok(())
    }
}
