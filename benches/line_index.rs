use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mless::file_handler::{LineIndex, MappedFile};
use mless::source::{FileSource, LineProvider};
use std::fmt::Write as _;
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;

const KB: usize = 1024;
const MB: usize = 1024 * KB;

fn write_fixture(mut sink: impl Write, target_bytes: usize) -> usize {
    let mut written = 0usize;
    let mut line_num = 0u64;

    while written < target_bytes {
        let timestamp_min = (line_num / 60) % 60;
        let timestamp_sec = line_num % 60;
        let mut line = String::with_capacity(120);
        let _ = writeln!(
            line,
            "2024-01-01 10:{:02}:{:02}.{:03} [Thread-{:02}] [INFO ] api        - request {:06} user_{:04}",
            timestamp_min,
            timestamp_sec,
            line_num % 1000,
            (line_num % 16) + 1,
            line_num,
            line_num % 10000
        );
        sink.write_all(line.as_bytes()).unwrap();
        written += line.len();
        line_num += 1;
    }

    written
}

fn fixture_file(target_bytes: usize) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create bench fixture");
    {
        let mut writer = BufWriter::new(file.as_file());
        write_fixture(&mut writer, target_bytes);
        writer.flush().unwrap();
    }
    file
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for &size in &[MB, 8 * MB, 32 * MB] {
        let file = fixture_file(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}MB", size / MB)),
            &file,
            |b, file| {
                b.iter(|| {
                    let mapped = MappedFile::open(file.path()).unwrap();
                    let index = LineIndex::build(&mapped);
                    black_box(index.line_count())
                });
            },
        );
    }

    group.finish();
}

fn bench_line_reads(c: &mut Criterion) {
    let file = fixture_file(8 * MB);
    let source = FileSource::open(file.path()).unwrap();
    let total = source.line_count();

    c.bench_function("sequential_page_reads", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for start in (0..total.min(10_000)).step_by(50) {
                for line in source.get_lines(start, 50) {
                    bytes += line.content.len();
                }
            }
            black_box(bytes)
        });
    });

    c.bench_function("random_line_reads", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            let mut i = 7usize;
            for _ in 0..1_000 {
                i = (i * 31 + 17) % total;
                if let Some(line) = source.get_line(i) {
                    bytes += line.content.len();
                }
            }
            black_box(bytes)
        });
    });
}

fn bench_time_lookup(c: &mut Criterion) {
    use chrono::{Local, TimeZone};

    let file = fixture_file(4 * MB);

    c.bench_function("find_line_at_time_cold", |b| {
        b.iter(|| {
            // Fresh source: every lookup pays the lazy parse
            let source = FileSource::open(file.path()).unwrap();
            let target = Local.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap();
            black_box(source.find_line_at_time(target))
        });
    });

    let warm = FileSource::open(file.path()).unwrap();
    let target = Local.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap();
    let _ = warm.find_line_at_time(target);

    c.bench_function("find_line_at_time_warm", |b| {
        b.iter(|| black_box(warm.find_line_at_time(target)));
    });
}

criterion_group!(benches, bench_index_build, bench_line_reads, bench_time_lookup);
criterion_main!(benches);
