#![no_main]

use libfuzzer_sys::fuzz_target;

use elster_transfer::core::{FieldId, FieldMap, FieldValue};
use elster_transfer::xml::{encode_all, est_trees};

// Each line is `id=value` or `id=a|b|c` for a repeated field.
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let mut fields = FieldMap::new();
    for line in s.lines() {
        let Some((id, value)) = line.split_once('=') else {
            continue;
        };
        let value = if value.contains('|') {
            FieldValue::Repeated(value.split('|').map(str::to_string).collect())
        } else {
            FieldValue::Single(value.to_string())
        };
        fields.insert(FieldId::plain(id), value);
    }
    if let Ok(elements) = encode_all(est_trees(), &fields) {
        for element in elements {
            let _ = element.to_xml_string();
        }
    }
});
