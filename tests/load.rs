use fxload::{
    load, records, DecodeError, DecoderConfig, LoadError, Record, RecordKind, Records, Transport,
    TransportError,
};

/// Transport recording every write, optionally failing the n-th one (counting from 1).
#[derive(Default)]
struct MockTransport {
    writes: Vec<(u16, Vec<u8>)>,
    fail_at: Option<usize>,
}

impl MockTransport {
    fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }
}

impl Transport for MockTransport {
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), TransportError> {
        self.writes.push((address, data.to_vec()));
        if self.fail_at == Some(self.writes.len()) {
            Err(TransportError::Usb(rusb::Error::Timeout))
        } else {
            Ok(())
        }
    }
}

/// Builds a hex image with `count` data records of increasing size.
fn image(count: usize) -> String {
    let mut lines = Vec::new();
    for i in 0..count {
        let payload = (0..=i as u8).collect();
        let record = Record::new(RecordKind::Data, (i * 0x40) as u16, payload);
        lines.push(record.encode());
    }
    lines.push(Record::new(RecordKind::EndOfFile, 0, Vec::new()).encode());
    lines.join("\n")
}

#[test]
fn single_record_image() {
    let mut transport = MockTransport::default();
    load(
        &mut transport,
        records(":03000000020000FB\n:00000001FF\n".as_bytes()),
    )
    .unwrap();
    assert_eq!(
        transport.writes,
        vec![
            (0xe600, vec![0x01]),
            (0x0000, vec![0x02, 0x00, 0x00]),
            (0xe600, vec![0x00]),
        ]
    );
}

#[test]
fn one_write_per_data_record() {
    for count in 0..8 {
        let image = image(count);
        let mut transport = MockTransport::default();
        load(&mut transport, records(image.as_bytes())).unwrap();

        assert_eq!(transport.writes.len(), count + 2);
        assert_eq!(transport.writes.first(), Some(&(0xe600, vec![1])));
        assert_eq!(transport.writes.last(), Some(&(0xe600, vec![0])));
        for (i, (address, data)) in transport.writes[1..=count].iter().enumerate() {
            assert_eq!(*address, (i * 0x40) as u16);
            assert_eq!(data.len(), i + 1);
        }
    }
}

#[test]
fn failing_write_aborts_without_resume() {
    let image = image(3);
    for n in 1..=5 {
        let mut transport = MockTransport::failing_at(n);
        let result = load(&mut transport, records(image.as_bytes()));

        assert!(matches!(
            result,
            Err(LoadError::Transport(TransportError::Usb(rusb::Error::Timeout)))
        ));
        assert_eq!(transport.writes.len(), n);
        let resumes = transport
            .writes
            .iter()
            .filter(|write| **write == (0xe600, vec![0]))
            .count();
        assert_eq!(resumes, if n == 5 { 1 } else { 0 });
    }
}

#[test]
fn empty_image_strict_and_permissive() {
    let mut transport = MockTransport::default();
    let result = load(&mut transport, records(&b""[..]));
    assert!(matches!(
        result,
        Err(LoadError::Decode(DecodeError::UnexpectedEndOfStream))
    ));
    assert!(transport.writes.is_empty());

    let mut transport = MockTransport::default();
    let permissive = Records::with_config(&b""[..], DecoderConfig { strict_eof: false });
    load(&mut transport, permissive).unwrap();
    assert_eq!(transport.writes, vec![(0xe600, vec![1]), (0xe600, vec![0])]);
}

#[test]
fn malformed_first_line_leaves_target_untouched() {
    let mut transport = MockTransport::default();
    let result = load(&mut transport, records("03000000020000FB\n".as_bytes()));
    assert!(matches!(
        result,
        Err(LoadError::Decode(DecodeError::MalformedRecord { line: 1 }))
    ));
    assert!(transport.writes.is_empty());
}

#[test]
fn missing_end_of_file_record_after_data() {
    let image = ":03000000020000FB\n";

    let mut transport = MockTransport::default();
    let result = load(&mut transport, records(image.as_bytes()));
    assert!(matches!(
        result,
        Err(LoadError::Decode(DecodeError::UnexpectedEndOfStream))
    ));
    // Halted and written, but never resumed
    assert_eq!(transport.writes.len(), 2);

    let mut transport = MockTransport::default();
    let permissive = Records::with_config(image.as_bytes(), DecoderConfig { strict_eof: false });
    load(&mut transport, permissive).unwrap();
    assert_eq!(transport.writes.len(), 3);
}

#[test]
fn loading_twice_gives_the_same_writes() {
    let image = image(4);
    let mut first = MockTransport::default();
    let mut second = MockTransport::default();
    load(&mut first, records(image.as_bytes())).unwrap();
    load(&mut second, records(image.as_bytes())).unwrap();
    assert_eq!(first.writes, second.writes);
}
