//! Replaying a recorded element with one sub-element excluded.

use proptest::prelude::*;
use wssec::c14n::{canonicalize, C14nMode, CanonicalizationDriver};
use wssec::core::ns;
use wssec::xml::{Exclusion, RecordingReader, StreamReader, XmlReader};

const SIGNATURE: &str = concat!(
    r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#,
    r##"<ds:SignedInfo><ds:Reference URI="#body"/></ds:SignedInfo>"##,
    r#"<ds:SignatureValue>AAAA</ds:SignatureValue>"#,
    r#"</ds:Signature>"#
);

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z ]{0,4}", Just("x&amp;y".to_owned())]
}

fn arb_element() -> impl Strategy<Value = String> {
    let leaf = (prop_oneof![Just("e"), Just("p:f")], arb_text())
        .prop_map(|(n, t)| format!("<{n}>{t}</{n}>"));
    leaf.prop_recursive(3, 16, 3, |inner| {
        (
            prop_oneof![Just("e"), Just("p:g")],
            prop::collection::vec(prop_oneof![inner, arb_text()], 0..3),
        )
            .prop_map(|(n, kids)| format!(r#"<{n} a="1">{}</{n}>"#, kids.concat()))
    })
}

fn replay_without_signature(doc: &str) -> Vec<u8> {
    let mut r = StreamReader::from_str(doc);
    r.move_to_content().unwrap();
    let mut rec = RecordingReader::attach(&mut r).unwrap();
    rec.skip().unwrap();
    let mut buffer = rec.into_buffer().unwrap();
    buffer.set_exclusion(Exclusion::new(ns::node::SIGNATURE, ns::DSIG));

    let mut driver = CanonicalizationDriver::default();
    driver.set_input_element(&buffer);
    driver.get_bytes().unwrap()
}

proptest! {
    #[test]
    fn excluded_element_leaves_everything_else_intact(
        before in prop::collection::vec(arb_element(), 0..3),
        after in prop::collection::vec(arb_element(), 0..3),
        nested in any::<bool>(),
    ) {
        let (before, after) = (before.concat(), after.concat());
        let (with, without) = if nested {
            (
                format!(r#"<r xmlns:p="urn:p">{before}<h>{SIGNATURE}</h>{after}</r>"#),
                format!(r#"<r xmlns:p="urn:p">{before}<h></h>{after}</r>"#),
            )
        } else {
            (
                format!(r#"<r xmlns:p="urn:p">{before}{SIGNATURE}{after}</r>"#),
                format!(r#"<r xmlns:p="urn:p">{before}{after}</r>"#),
            )
        };

        let replayed = replay_without_signature(&with);
        let expected = canonicalize(&without, C14nMode::Exclusive, &[]).unwrap();
        prop_assert_eq!(String::from_utf8(replayed).unwrap(), String::from_utf8(expected).unwrap());
    }
}

#[test]
fn depth_limited_exclusion_spares_deeper_matches() {
    let doc = format!(r#"<r><h>{SIGNATURE}</h>{SIGNATURE}</r>"#);
    let mut r = StreamReader::from_str(&doc);
    r.move_to_content().unwrap();
    let mut rec = RecordingReader::attach(&mut r).unwrap();
    rec.skip().unwrap();
    let mut buffer = rec.into_buffer().unwrap();
    buffer.set_exclusion(Exclusion::new(ns::node::SIGNATURE, ns::DSIG).at_depth(1));

    let mut driver = CanonicalizationDriver::default();
    driver.set_input_element(&buffer);
    let replayed = driver.get_bytes().unwrap();
    let expected = canonicalize(&format!("<r><h>{SIGNATURE}</h></r>"), C14nMode::Exclusive, &[]).unwrap();
    assert_eq!(replayed, expected);
}
