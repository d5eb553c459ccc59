//! Criterion benchmarks for command construction and event-name lookup.
//!
//! Both sit on the hot path between the managed application and the native
//! session: every call builds a command, every notification parses a name.
//!
//! Run with:
//! ```bash
//! cargo bench --package avbridge-core --bench protocol_bench
//! ```

use avbridge_core::{Command, ConnectOptions, EventName, Opcode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_command_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("command");
    let options = ConnectOptions::new("bench-room", "bench-token");

    group.bench_function("connect_facade", |b| {
        b.iter(|| Command::connect(black_box(&options)))
    });
    group.bench_function("toggle_video_facade", |b| {
        b.iter(|| Command::toggle_video(black_box(true)))
    });
    group.bench_function("from_raw_validated", |b| {
        b.iter(|| Command::from_raw(black_box(15), vec!["PA1".into(), true.into()]))
    });
    group.bench_function("connect_args_json", |b| {
        let cmd = Command::connect(&options);
        b.iter(|| black_box(&cmd).args_json())
    });
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for name in [
        EventName::CameraSwitched,
        EventName::StatsReceived,
        EventName::LocalParticipantSupportedCodecs,
    ] {
        group.bench_with_input(BenchmarkId::new("event_from_str", name), &name, |b, n| {
            b.iter(|| black_box(n.as_str()).parse::<EventName>())
        });
    }

    group.bench_function("opcode_try_from", |b| {
        b.iter(|| Opcode::try_from(black_box(10u8)))
    });
    group.finish();
}

criterion_group!(benches, bench_command_construction, bench_lookup);
criterion_main!(benches);
