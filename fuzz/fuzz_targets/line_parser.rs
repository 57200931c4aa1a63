#![no_main]

use libfuzzer_sys::fuzz_target;
use logweave_pipeline::parser::create_parser;

const FORMATS: [&str; 4] = ["json", "nginx", "apache", "text"];

fuzz_target!(|data: &[u8]| {
    // 라인 파서는 어떤 입력에도 엔트리를 반환해야 함
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    for format in FORMATS {
        if let Ok(parser) = create_parser(format) {
            let _ = parser.parse_line(line, "fuzz");
        }
    }
});
