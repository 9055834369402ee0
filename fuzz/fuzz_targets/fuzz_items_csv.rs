#![no_main]
use std::io::Write;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let path = std::env::temp_dir().join(format!("sorter_fuzz_items_{}.csv", std::process::id()));
    let Ok(mut f) = std::fs::File::create(&path) else {
        return;
    };
    if f.write_all(data).is_err() {
        return;
    }
    drop(f);
    if let Ok(rows) = sorter_config::load_items_csv(&path) {
        assert!(rows.iter().all(|r| r.grams.is_finite() && r.grams >= 0.0));
    }
});
