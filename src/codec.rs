//! Binary position log codec
//!
//! The log is a plain concatenation of records with no header, footer or
//! record count; the end of the input is the only framing. Each record is,
//! little-endian and without padding:
//!
//! | field          | encoding                                 |
//! |----------------|------------------------------------------|
//! | vehicle id     | `i32`                                    |
//! | registration   | single-byte characters, `0x00`-terminated |
//! | latitude       | `f32`                                    |
//! | longitude      | `f32`                                    |
//! | recorded at    | `u64` seconds since the Unix epoch       |
//!
//! The timestamp is reinterpreted as `i64` before conversion, so values
//! above `i64::MAX` land before 1970.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Take, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::DateTime;

use crate::{errors::LocatorError, models::PositionRecord};

/// Streaming decoder over a byte source of known length
///
/// Yields records in input order. After the first error the reader is
/// exhausted.
pub struct RecordReader<R> {
    inner: Take<R>,
    offset: u64,
    len: u64,
    failed: bool,
}

impl<R: BufRead> RecordReader<R> {
    /// Create a reader over the first `len` bytes of `inner`
    pub fn new(inner: R, len: u64) -> Self {
        Self {
            inner: inner.take(len),
            offset: 0,
            len,
            failed: false,
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the read position has reached the declared length
    pub fn is_exhausted(&self) -> bool {
        self.offset == self.len
    }

    /// Read one complete record
    pub fn read_record(&mut self) -> Result<PositionRecord, LocatorError> {
        let start = self.offset;

        let vehicle_id =
            self.read_field(start, "vehicle_id", 4, |r| r.read_i32::<LittleEndian>())?;
        let registration = self.read_registration(start)?;
        let latitude = self.read_field(start, "latitude", 4, |r| r.read_f32::<LittleEndian>())?;
        let longitude =
            self.read_field(start, "longitude", 4, |r| r.read_f32::<LittleEndian>())?;
        let raw = self.read_field(start, "recorded_at", 8, |r| r.read_u64::<LittleEndian>())?;

        let recorded_at = DateTime::from_timestamp(raw as i64, 0)
            .ok_or(LocatorError::TimestampOutOfRange { offset: start, raw })?;

        Ok(PositionRecord {
            vehicle_id,
            registration,
            latitude,
            longitude,
            recorded_at,
        })
    }

    fn read_field<T>(
        &mut self,
        start: u64,
        field: &'static str,
        size: u64,
        read: impl FnOnce(&mut Take<R>) -> io::Result<T>,
    ) -> Result<T, LocatorError> {
        match read(&mut self.inner) {
            Ok(value) => {
                self.offset += size;
                Ok(value)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(LocatorError::TruncatedRecordError {
                    offset: start,
                    field,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_registration(&mut self, start: u64) -> Result<String, LocatorError> {
        let mut bytes = Vec::new();
        let n = self.inner.read_until(0, &mut bytes)?;
        self.offset += n as u64;

        if bytes.pop() != Some(0) {
            return Err(LocatorError::TruncatedRecordError {
                offset: start,
                field: "registration",
            });
        }

        // ISO-8859-1: each byte is the code point of the same value
        Ok(bytes.into_iter().map(char::from).collect())
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<PositionRecord, LocatorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_exhausted() {
            return None;
        }
        let result = self.read_record();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Decode all records from the first `len` bytes of `reader`
pub fn decode<R: BufRead>(reader: R, len: u64) -> Result<Vec<PositionRecord>, LocatorError> {
    RecordReader::new(reader, len).collect()
}

/// Decode all records from an in-memory log
pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<PositionRecord>, LocatorError> {
    decode(bytes, bytes.len() as u64)
}

/// Decode all records from the file at `path`
///
/// The file is closed before returning, on success and on failure. Read
/// failures other than end of input are reported as the source being
/// unavailable.
pub fn decode_file(path: &Path) -> Result<Vec<PositionRecord>, LocatorError> {
    let unavailable = |source| LocatorError::SourceUnavailableError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unavailable)?;
    let len = file.metadata().map_err(unavailable)?.len();

    decode(BufReader::new(file), len).map_err(|e| match e {
        LocatorError::IoError(source) => unavailable(source),
        e => e,
    })
}

/// Encoder writing records in the position log layout
pub struct RecordWriter<W> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one record, returning the number of bytes written
    pub fn write_record(&mut self, record: &PositionRecord) -> Result<u64, LocatorError> {
        let registration = encode_registration(&record.registration)?;

        self.inner.write_i32::<LittleEndian>(record.vehicle_id)?;
        self.inner.write_all(&registration)?;
        self.inner.write_u8(0)?;
        self.inner.write_f32::<LittleEndian>(record.latitude)?;
        self.inner.write_f32::<LittleEndian>(record.longitude)?;
        self.inner
            .write_u64::<LittleEndian>(record.recorded_at.timestamp() as u64)?;

        Ok(4 + registration.len() as u64 + 1 + 4 + 4 + 8)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Encode records into an in-memory log
pub fn encode_records<'a>(
    records: impl IntoIterator<Item = &'a PositionRecord>,
) -> Result<Vec<u8>, LocatorError> {
    let mut writer = RecordWriter::new(Vec::new());
    for record in records {
        writer.write_record(record)?;
    }
    Ok(writer.into_inner())
}

fn encode_registration(registration: &str) -> Result<Vec<u8>, LocatorError> {
    registration
        .chars()
        .map(|c| match u8::try_from(c) {
            Ok(b) if b != 0 => Ok(b),
            _ => Err(LocatorError::InvalidRegistration(registration.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(vehicle_id: i32, registration: &str, latitude: f32, longitude: f32) -> PositionRecord {
        PositionRecord {
            vehicle_id,
            registration: registration.to_string(),
            latitude,
            longitude,
            recorded_at: Utc.with_ymd_and_hms(2023, 7, 11, 8, 30, 15).unwrap(),
        }
    }

    /// vehicle id 7, registration "AB", then a partial latitude
    fn truncated_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&7i32.to_le_bytes());
        bytes.extend_from_slice(b"AB\0");
        bytes.extend_from_slice(&34.0f32.to_le_bytes()[..2]);
        bytes
    }

    #[test]
    fn decode_known_bytes() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-5i32).to_le_bytes());
        bytes.extend_from_slice(b"CA 123-456\0");
        bytes.extend_from_slice(&34.544909f32.to_le_bytes());
        bytes.extend_from_slice(&(-102.100843f32).to_le_bytes());
        bytes.extend_from_slice(&1_689_064_215u64.to_le_bytes());

        let records = decode_bytes(&bytes).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.vehicle_id, -5);
        assert_eq!(r.registration, "CA 123-456");
        assert_eq!(r.latitude, 34.544909);
        assert_eq!(r.longitude, -102.100843);
        assert_eq!(r.recorded_at, Utc.with_ymd_and_hms(2023, 7, 11, 8, 30, 15).unwrap());
    }

    #[test]
    fn round_trip() {
        let original = record(123, "ZS 987 GP", -33.9249, 18.4241);
        let bytes = encode_records([&original]).unwrap();
        assert_eq!(bytes.len(), 4 + 10 + 4 + 4 + 8);

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded, vec![original]);
    }

    #[test]
    fn preserves_input_order() {
        let records: Vec<_> = (0..5)
            .map(|i| record(i, &format!("REG{i}"), i as f32, -(i as f32)))
            .collect();
        let bytes = encode_records(&records).unwrap();

        let decoded = decode_bytes(&bytes).unwrap();
        let ids: Vec<_> = decoded.iter().map(|r| r.vehicle_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(decoded, records);
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(decode_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn empty_registration() {
        let bytes = encode_records([&record(1, "", 1.0, 2.0)]).unwrap();
        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded[0].registration, "");
    }

    #[test]
    fn truncated_latitude() {
        let err = decode_bytes(&truncated_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LocatorError::TruncatedRecordError {
                offset: 0,
                field: "latitude"
            }
        ));
    }

    #[test]
    fn unterminated_registration() {
        let mut bytes = 7i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"ABC");

        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            LocatorError::TruncatedRecordError {
                field: "registration",
                ..
            }
        ));
    }

    #[test]
    fn truncation_after_complete_record_reports_offset() {
        let mut bytes = encode_records([&record(1, "A", 1.0, 2.0)]).unwrap();
        let first_len = bytes.len() as u64;
        bytes.extend_from_slice(&[1, 2]);

        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            LocatorError::TruncatedRecordError { offset, field: "vehicle_id" } if offset == first_len
        ));
    }

    #[test]
    fn reader_stops_at_declared_length() {
        let mut bytes = encode_records([&record(1, "A", 1.0, 2.0)]).unwrap();
        let len = bytes.len() as u64;
        bytes.extend_from_slice(b"trailing garbage");

        let records = decode(bytes.as_slice(), len).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn declared_length_longer_than_stream_is_truncation() {
        let bytes = encode_records([&record(1, "A", 1.0, 2.0)]).unwrap();
        let err = decode(bytes.as_slice(), bytes.len() as u64 + 4).unwrap_err();
        assert!(matches!(err, LocatorError::TruncatedRecordError { .. }));
    }

    #[test]
    fn reader_fuses_after_error() {
        let bytes = truncated_bytes();
        let mut reader = RecordReader::new(bytes.as_slice(), bytes.len() as u64);

        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn reader_tracks_offset() {
        let bytes = encode_records([&record(1, "AB", 1.0, 2.0), &record(2, "C", 3.0, 4.0)]).unwrap();
        let mut reader = RecordReader::new(bytes.as_slice(), bytes.len() as u64);

        reader.read_record().unwrap();
        assert_eq!(reader.offset(), 4 + 3 + 4 + 4 + 8);
        assert!(!reader.is_exhausted());
        reader.read_record().unwrap();
        assert!(reader.is_exhausted());
    }

    #[test]
    fn high_bytes_decode_as_latin1() {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[b'A', 0xC9, 0]);
        bytes.extend_from_slice(&[0; 16]);

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded[0].registration, "A\u{C9}");

        let encoded = encode_records(&decoded).unwrap();
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn timestamp_above_i64_max_wraps_before_epoch() {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded[0].recorded_at, Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap());

        let encoded = encode_records(&decoded).unwrap();
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn unrepresentable_timestamp() {
        let mut bytes = 1i32.to_le_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&(i64::MAX as u64).to_le_bytes());

        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            LocatorError::TimestampOutOfRange { offset: 0, raw } if raw == i64::MAX as u64
        ));
    }

    #[test]
    fn rejects_unencodable_registration() {
        let err = encode_records([&record(1, "A\0B", 0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, LocatorError::InvalidRegistration(_)));

        let err = encode_records([&record(1, "Ω", 0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, LocatorError::InvalidRegistration(_)));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = decode_file(Path::new("/nonexistent/positions.dat")).unwrap_err();
        assert!(matches!(err, LocatorError::SourceUnavailableError { .. }));
    }
}
