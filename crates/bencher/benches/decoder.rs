use bencher::TestCase;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lambda_api_http::codec::base64;
use lambda_api_http::codec::multipart::MultipartDecoder;
use std::hint::black_box;

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::small("single_small_file"), TestCase::normal("four_4k_files"), TestCase::large("sixteen_64k_files")]
}

fn benchmark_multipart_decoder(criterion: &mut Criterion) {
    let test_cases = create_test_cases();
    let mut group = criterion.benchmark_group("multipart_decoder");

    for case in test_cases {
        group.throughput(Throughput::Bytes(case.body().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| {
                let decoder = MultipartDecoder::new(case.body().clone(), case.content_type())
                    .expect("input should be a valid multipart body");
                black_box(decoder.into_parts());
            });
        });
    }

    group.finish();
}

fn benchmark_base64_body(criterion: &mut Criterion) {
    let case = TestCase::large("sixteen_64k_files");
    let encoded = base64::encode(case.body());
    let mut group = criterion.benchmark_group("base64_body");
    group.throughput(Throughput::Bytes(case.body().len() as u64));

    group.bench_function("encode", |b| b.iter(|| black_box(base64::encode(case.body()))));
    group.bench_function("decode", |b| b.iter(|| black_box(base64::decode(&encoded).expect("input should be valid base64"))));

    group.finish();
}

criterion_group!(decoder, benchmark_multipart_decoder, benchmark_base64_body);
criterion_main!(decoder);
