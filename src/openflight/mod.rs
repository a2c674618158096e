//! Minimal OpenFlight record walker.
//!
//! Every record starts with a big-endian `u16` opcode and `u16` length (header
//! included). Only the texture palette is decoded; all other records are
//! skipped by length.

use std::io::{ErrorKind, Read};

use crate::error::{CdbError, Result};

pub const OPCODE_HEADER: u16 = 1;
pub const OPCODE_TEXTURE_PALETTE: u16 = 64;

const RECORD_HEADER_LEN: usize = 4;
/// Texture palette file name field, NUL padded.
const TEXTURE_NAME_LEN: usize = 200;

/// The record kinds the audit cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    TexturePalette { file_name: String, pattern_index: i32 },
    Other { opcode: u16 },
}

/// Iterates the records of an OpenFlight stream.
pub struct RecordReader<R: Read> {
    reader: R,
    first: bool,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            first: true,
            done: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<Record>> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        match read_full(&mut self.reader, &mut header)? {
            0 => return Ok(None),
            RECORD_HEADER_LEN => {}
            n => {
                return Err(CdbError::SceneFile(format!(
                    "truncated record header ({} bytes)",
                    n
                )))
            }
        }

        let opcode = u16::from_be_bytes([header[0], header[1]]);
        let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
        if self.first && opcode != OPCODE_HEADER {
            return Err(CdbError::SceneFile(format!(
                "expected header record, found opcode {}",
                opcode
            )));
        }
        self.first = false;
        if length < RECORD_HEADER_LEN {
            return Err(CdbError::SceneFile(format!(
                "record length {} shorter than its header",
                length
            )));
        }

        let mut body = vec![0u8; length - RECORD_HEADER_LEN];
        if read_full(&mut self.reader, &mut body)? != body.len() {
            return Err(CdbError::SceneFile(format!(
                "truncated record body (opcode {})",
                opcode
            )));
        }

        if opcode == OPCODE_TEXTURE_PALETTE {
            return Ok(Some(texture_palette(&body)?));
        }
        Ok(Some(Record::Other { opcode }))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                if self.first {
                    Some(Err(CdbError::SceneFile("empty stream".to_string())))
                } else {
                    None
                }
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn texture_palette(body: &[u8]) -> Result<Record> {
    if body.len() < TEXTURE_NAME_LEN {
        return Err(CdbError::SceneFile("texture palette record too short".to_string()));
    }
    let name = &body[..TEXTURE_NAME_LEN];
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    let file_name = String::from_utf8_lossy(&name[..end]).trim().to_string();

    let pattern_index = body
        .get(TEXTURE_NAME_LEN..TEXTURE_NAME_LEN + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0);

    Ok(Record::TexturePalette {
        file_name,
        pattern_index,
    })
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// File names of every texture palette entry, in record order.
pub fn texture_names<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for record in RecordReader::new(reader) {
        if let Record::TexturePalette { file_name, .. } = record? {
            if !file_name.is_empty() {
                names.push(file_name);
            }
        }
    }
    Ok(names)
}
