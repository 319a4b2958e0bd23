#![no_main]

use arbitrary::Arbitrary;
use cloudevents_http::{Config, Data, Dispatcher, Headers, JsonOrString, Mode};
use libfuzzer_sys::fuzz_target;

const MAX_HEADERS: usize = 32;

#[derive(Arbitrary, Debug)]
enum Body {
    Missing,
    Text(String),
    Bytes(Vec<u8>),
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    headers: Vec<(String, String)>,
    body: Body,
    bare_extensions: bool,
}

fn fuzz(input: FuzzInput) {
    let headers: Headers = input.headers.into_iter().take(MAX_HEADERS).collect();
    let body = match input.body {
        Body::Missing => None,
        Body::Text(text) => Some(Data::from(text)),
        Body::Bytes(bytes) => Some(Data::from(bytes)),
    };
    let dispatcher = Dispatcher::new(Config {
        bare_extensions: input.bare_extensions,
        ..Config::default()
    });

    let Ok(event) = dispatcher.from_http(&headers, body, &JsonOrString) else {
        return;
    };

    // Anything that decodes must encode in both modes and decode again
    for mode in [Mode::Binary, Mode::Structured] {
        let (headers, body) = match mode {
            Mode::Binary => dispatcher.to_binary(&event, &cloudevents_http::BestEffortJson),
            Mode::Structured => dispatcher.to_structured(&event, &cloudevents_http::Identity),
        }
        .expect("decoded event must encode");
        dispatcher
            .from_http(&headers, Some(Data::from(body)), &JsonOrString)
            .expect("encoded event must decode");
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
