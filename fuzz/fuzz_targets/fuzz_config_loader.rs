#![no_main]

use libfuzzer_sys::fuzz_target;
use redlight::config::loader::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    // Loading must reject bad input with an error, never a panic.
    if let Ok(yaml) = std::str::from_utf8(data) {
        let _ = ConfigLoader::with_defaults().load_from_str(yaml);
    }
});
