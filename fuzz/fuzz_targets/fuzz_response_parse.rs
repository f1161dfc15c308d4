#![no_main]

use libfuzzer_sys::fuzz_target;

use elster_transfer::xml::parse;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        let _ = elster_transfer::xml::Element::parse(s);
        let _ = parse::get_transfer_ticket(s);
        let _ = parse::get_relevant_beleg_ids(s, &["VaSt_Pers1"]);
        let _ = parse::get_state_ids(s);
        let _ = parse::get_tax_offices(s);
        let _ = parse::server_error_contains_code(s, "371015213");
    }
});
