#![no_main]

use libfuzzer_sys::fuzz_target;
use redlight::admin::AdminCommand;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = AdminCommand::parse(line);
    }
});
