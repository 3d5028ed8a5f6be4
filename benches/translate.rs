use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use syslog_event_engine::{
    Datagram, Facility, MessageConverter, MessageParser, ParseError, Severity, SyslogMessage,
    TranslatorConfig, DEFAULT_LOCATION,
};

/// Fixed-shape parser so the benchmark measures the engine, not the
/// collaborator.
struct BenchParser;

impl MessageParser for BenchParser {
    fn parse(&self, buf: &[u8]) -> Result<SyslogMessage, ParseError> {
        let text = std::str::from_utf8(buf).map_err(|e| ParseError::Malformed(e.to_string()))?;
        let mut msg = SyslogMessage::new(Facility::Daemon, Severity::Warning, text);
        msg.hostname = Some("gw01".to_string());
        msg.process_name = Some("monitord".to_string());
        msg.process_id = Some(7);
        Ok(msg)
    }
}

fn rule_config() -> TranslatorConfig {
    TranslatorConfig::from_yaml(
        r#"
rules:
  - uei: "uei/net/linkDown"
    facilities: [daemon]
    match:
      type: substring
      expression: "link down"
  - uei: "uei.disk.full"
    match:
      type: regex
      expression: 'disk (\S+) at (\d+)%'
      default-parameter-mapping: true
hide-rules:
  - match:
      type: substring
      expression: "password"
"#,
    )
    .unwrap()
}

fn bench_convert(c: &mut Criterion) {
    let converter = MessageConverter::new(Arc::new(rule_config()), Arc::new(BenchParser))
        .with_identity("sys-1", DEFAULT_LOCATION)
        .with_host("collector01");
    let source = "192.0.2.1".parse().unwrap();

    c.bench_function("convert_unmatched", |b| {
        let datagram = Datagram::new(source, &b"interface flap detected on eth2"[..]);
        b.iter(|| black_box(converter.convert(black_box(&datagram))))
    });

    c.bench_function("convert_regex_match", |b| {
        let datagram = Datagram::new(source, &b"disk /var at 92%"[..]);
        b.iter(|| black_box(converter.convert(black_box(&datagram))))
    });

    c.bench_function("convert_batch_256", |b| {
        let datagrams: Vec<Datagram> = (0..256)
            .map(|i| Datagram::new(source, format!("disk /var at {}%", i % 100).into_bytes()))
            .collect();
        b.iter(|| black_box(converter.convert_batch(black_box(&datagrams))))
    });
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
