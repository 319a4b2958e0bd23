use super::{sample_event, SIZES};
use cloudevents_http::{to_binary, to_structured, Data, Dispatcher, JsonOrString};
use criterion::{black_box, criterion_group, Criterion};

fn bench_from_http(c: &mut Criterion) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dispatcher = Dispatcher::default();
    for size in SIZES {
        let event = sample_event(size);
        for (mode, (headers, body)) in [
            ("binary", to_binary(&event).unwrap()),
            ("structured", to_structured(&event).unwrap()),
        ] {
            c.bench_function(
                &format!("{}/mode={} size={}", module_path!(), mode, size),
                |b| {
                    b.iter(|| {
                        let body = Some(Data::from(body.as_slice()));
                        black_box(
                            dispatcher
                                .from_http(&headers, body, &JsonOrString)
                                .unwrap(),
                        )
                    })
                },
            );
        }
    }
}

criterion_group!(benches, bench_from_http);
