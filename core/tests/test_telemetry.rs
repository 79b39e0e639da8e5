// # 📂 `tests/test_telemetry.rs`

// * ✅ snapshot counters match bytes on disk / in memory
// * ✅ stage coverage per direction and path
// * ✅ JSON export and re-import

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use blockmode_core::context::CipherContext;
    use blockmode_core::crypto::{CipherMode, PaddingMode, Xtea};
    use blockmode_core::stream::{decrypt_stream, encrypt_stream, InputSource, OutputSink, ParallelismProfile, StreamConfig};
    use blockmode_core::telemetry::{
        Direction, ProcessingPath, Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer,
    };

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn ctx() -> CipherContext {
        CipherContext::new(Xtea::new(b"telemetry-key-16").unwrap(), CipherMode::Ctr, PaddingMode::Pkcs7, Some(&[4u8; 8][..]))
            .unwrap()
    }

    fn config() -> StreamConfig {
        StreamConfig { max_in_memory_size: 512, chunk_size: 128, profile: Some(ParallelismProfile::new(2, 4)) }
    }

    fn assert_sane(snap: &TelemetrySnapshot) {
        assert!(snap.has_all_stages(), "missing stages: {:?}", snap.stage_times);
        assert!(snap.throughput_bytes_per_sec >= 0.0);
        assert!(snap.elapsed > Duration::ZERO);
        if let Some(out) = &snap.output {
            assert_eq!(out.len() as u64, snap.bytes_out);
        }
    }

    // ------------------------------------------------------------
    // Snapshots from real runs
    // ------------------------------------------------------------
    #[test]
    fn in_memory_snapshot() {
        let snap = encrypt_stream(&ctx(), InputSource::Memory(vec![1u8; 100]), OutputSink::Memory, &config()).unwrap();
        assert_eq!(snap.path, ProcessingPath::InMemory);
        assert_eq!(snap.direction, Direction::Encrypt);
        assert_eq!(snap.chunks, 1);
        assert_eq!(snap.bytes_in, 100);
        assert_eq!(snap.bytes_out, 104);
        assert_sane(&snap);
    }

    #[test]
    fn streamed_snapshots_for_both_directions() {
        let plain = vec![0xabu8; 1000];
        let enc = encrypt_stream(&ctx(), InputSource::Memory(plain.clone()), OutputSink::Memory, &config()).unwrap();
        assert_eq!(enc.path, ProcessingPath::Streamed);
        assert_eq!(enc.chunks, 8);
        assert_eq!(enc.bytes_in, 1000);
        assert_eq!(enc.bytes_out, 7 * 136 + 112);
        assert_sane(&enc);

        let ct = enc.output.clone().unwrap();
        let dec = decrypt_stream(&ctx(), InputSource::Memory(ct), OutputSink::Memory, &config()).unwrap();
        assert_eq!(dec.direction, Direction::Decrypt);
        assert_eq!(dec.expected_stages(), [Stage::Read, Stage::Decrypt, Stage::Write]);
        assert_eq!(dec.bytes_in, enc.bytes_out);
        assert_eq!(dec.bytes_out, 1000);
        assert_sane(&dec);
        assert_eq!(dec.output.as_deref(), Some(&plain[..]));
    }

    // ------------------------------------------------------------
    // Building and exporting
    // ------------------------------------------------------------
    #[test]
    fn snapshot_from_counters_and_timer() {
        let mut counters = TelemetryCounters::default();
        counters.add_chunk(64, 72);
        counters.add_chunk(10, 16);

        let mut timer = TelemetryTimer::new();
        timer.add_stage_time(Stage::Read, Duration::from_millis(2));
        timer.add_stage_time(Stage::Encrypt, Duration::from_millis(5));
        timer.finish();

        let snap = TelemetrySnapshot::from(&counters, &timer, Direction::Encrypt, ProcessingPath::Streamed);
        assert_eq!(snap.chunks, 2);
        assert_eq!(snap.bytes_in, 74);
        assert_eq!(snap.bytes_out, 88);
        assert_eq!(snap.stage_times.get(Stage::Encrypt), Duration::from_millis(5));
        assert!(!snap.has_all_stages());
        assert!(snap.output.is_none());
    }

    #[test]
    fn json_export_round_trips() {
        let snap = encrypt_stream(&ctx(), InputSource::Memory(vec![7u8; 40]), OutputSink::Memory, &config()).unwrap();
        let json = snap.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["path"], "InMemory");
        assert_eq!(value["direction"], "Encrypt");
        assert_eq!(value["bytes_in"], 40);

        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chunks, snap.chunks);
        assert_eq!(back.bytes_out, snap.bytes_out);
        assert_eq!(back.stage_times, snap.stage_times);
        assert_eq!(back.output, snap.output);
    }

    #[test]
    fn output_is_omitted_from_json_when_absent() {
        let snap = TelemetrySnapshot::from(
            &TelemetryCounters::default(),
            &TelemetryTimer::new(),
            Direction::Decrypt,
            ProcessingPath::InMemory,
        );
        let value: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert!(value.get("output").is_none());
    }
}
