//! Signing and verifying references end to end.

use base64::Engine;
use wssec::c14n::{canonicalize, C14nMode, CanonicalizationDriver};
use wssec::core::{algorithm, ns, Error};
use wssec::dsig::{
    DigestApplication, DigestSource, DsigContext, Reference, ReferenceWrapper, SignedInfo,
    VerificationState,
};
use wssec::transforms::{ExclusiveC14nTransform, StrTransform, TransformChain, TransformInput};
use wssec::xml::{Exclusion, RecordingReader, SecurityElement, StreamReader, XmlReader, XmlTextWriter};

const WSU: &str = ns::WSU;
const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

fn exc() -> TransformChain {
    TransformChain::single(Box::new(ExclusiveC14nTransform::default()))
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[test]
fn digest_of_a_hi_is_verified_once() {
    let canonical = canonicalize("<a>hi</a>", C14nMode::Exclusive, &[]).unwrap();
    assert_eq!(canonical, b"<a>hi</a>");
    let d = wssec::crypto::digest::digest(algorithm::SHA256, &canonical).unwrap();
    assert_eq!(
        hex::encode(&d),
        "18fb6461df1a76db1b2f424ae73edad30e91028accba5a3a8b04f16d8702e095"
    );

    let mut reference = Reference::new("#a", algorithm::SHA256, exc());
    reference.digest_value = d;
    let mut wrapper = ReferenceWrapper::new(reference).unwrap();
    let mut pool = DsigContext::default().create_resource_pool();

    let mut first = StreamReader::from_str("<a>hi</a>");
    assert_eq!(
        wrapper
            .ensure_digest_validity("a", DigestSource::Input(TransformInput::Reader(&mut first)), &mut pool)
            .unwrap(),
        DigestApplication::Applied
    );
    assert_eq!(wrapper.state(), VerificationState::Verified);

    let mut second = StreamReader::from_str("<a>hi</a>");
    assert_eq!(
        wrapper
            .ensure_digest_validity("a", DigestSource::Input(TransformInput::Reader(&mut second)), &mut pool)
            .unwrap(),
        DigestApplication::NotApplicable
    );
    assert_eq!(wrapper.state(), VerificationState::Verified);
}

#[test]
fn malformed_uris_never_reach_digesting() {
    for uri in ["#", "a", "body", "x#body"] {
        let reference = Reference::new(uri, algorithm::SHA256, exc());
        let err = ReferenceWrapper::new(reference).unwrap_err();
        assert!(matches!(err, Error::InvalidUri(ref u) if u == uri), "{uri}");
        assert_eq!(err.kind(), wssec::ErrorKind::Protocol);
    }
}

fn body(text: &str) -> String {
    format!(r#"<s:Body xmlns:s="urn:soap" xmlns:u="{WSU}" u:Id="body"><m:Ping xmlns:m="urn:m">{text}</m:Ping></s:Body>"#)
}

const TOKEN: &str = concat!(
    r#"<o:BinarySecurityToken xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd" "#,
    r#"xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd" "#,
    r#"u:Id="tok">AQIDBA==</o:BinarySecurityToken>"#
);

/// A Security header with a signature over the body and, through
/// STR-Transform, over the token.
fn signed_message(ctx: &DsigContext, signed_body: &str, sent_body: &str) -> String {
    let mut pool = ctx.create_resource_pool();

    let mut str_reference = Reference::new(
        "#str-1",
        algorithm::SHA1,
        TransformChain::single(Box::new(StrTransform::default())),
    );
    let mut token = StreamReader::from_str(TOKEN);
    str_reference.sign(TransformInput::Reader(&mut token), &mut pool).unwrap();

    let mut body_reference = Reference::new("#body", algorithm::SHA256, exc());
    let mut reader = StreamReader::from_str(signed_body);
    body_reference.sign(TransformInput::Reader(&mut reader), &mut pool).unwrap();

    let mut signed_info = SignedInfo::new(ExclusiveC14nTransform::default(), algorithm::HMAC_SHA256);
    // The STR reference comes first; it must not capture the body.
    signed_info.add_reference(str_reference).unwrap();
    signed_info.add_reference(body_reference).unwrap();
    let signature = signed_info
        .compute_signature(KEY, ctx.registry.as_ref(), &mut pool)
        .unwrap();

    let mut w = XmlTextWriter::new(Vec::new());
    signed_info.write_to(&mut w).unwrap();
    let signed_info_xml = String::from_utf8(w.into_inner().unwrap()).unwrap();

    format!(
        concat!(
            r#"<s:Envelope xmlns:s="urn:soap"><s:Header>"#,
            r#"<o:Security xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">"#,
            "{token}",
            r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">{si}<ds:SignatureValue>{sv}</ds:SignatureValue></ds:Signature>"#,
            r#"</o:Security></s:Header>{body}</s:Envelope>"#
        ),
        token = TOKEN,
        si = signed_info_xml,
        sv = b64(&signature),
        body = sent_body,
    )
}

/// Walk the message the way a Security header processor does: one
/// forward pass, offering each element to the signature as it goes by.
fn verify_message(ctx: &DsigContext, message: &str) -> wssec::Result<()> {
    let mut pool = ctx.create_resource_pool();
    let mut r = StreamReader::from_str(message);
    r.move_to_content()?;
    r.read_start_element("Envelope", "urn:soap")?;
    r.read_start_element("Header", "urn:soap")?;
    r.read_start_element("Security", ns::WSSE)?;

    // The token precedes the signature; record it for later.
    r.move_to_content()?;
    let mut rec = RecordingReader::attach(&mut r)?;
    rec.skip()?;
    let token = rec.into_buffer()?;

    r.read_start_element(ns::node::SIGNATURE, ns::DSIG)?;
    let mut signed_info = SignedInfo::read_from(&mut r, ctx)?;
    let signature_value = r.read_element_content_as_base64(ns::node::SIGNATURE_VALUE, ns::DSIG)?;
    r.read_end_element()?; // Signature
    signed_info.verify_signature(KEY, &signature_value, ctx.registry.as_ref(), &mut pool)?;

    let token_id = token.id().unwrap_or_default().to_owned();
    assert_eq!(token_id, "tok");
    signed_info.ensure_digest_validity(
        &token_id,
        DigestSource::Input(TransformInput::Element(&token)),
        &mut pool,
    )?;

    r.read_end_element()?; // Security
    r.read_end_element()?; // Header
    assert!(r.is_start_element("Body", "urn:soap")?);
    let body_id = r.get_attribute("Id", WSU).unwrap_or_default().to_owned();
    let applied = signed_info.ensure_digest_validity(
        &body_id,
        DigestSource::Input(TransformInput::Reader(&mut r)),
        &mut pool,
    )?;
    assert_eq!(applied, DigestApplication::Applied);
    signed_info.ensure_all_references_verified()
}

#[test]
fn signed_message_verifies_in_one_pass() {
    let ctx = DsigContext::default();
    let message = signed_message(&ctx, &body("hi"), &body("hi"));
    verify_message(&ctx, &message).unwrap();
}

#[test]
fn tampered_body_fails_its_digest() {
    let ctx = DsigContext::default();
    let message = signed_message(&ctx, &body("hi"), &body("ho"));
    let err = verify_message(&ctx, &message).unwrap_err();
    assert!(matches!(err, Error::DigestVerificationFailed(ref uri) if uri == "#body"), "{err}");
}

#[test]
fn restricted_registry_rejects_sha1_references() {
    let signer = DsigContext::default();
    let message = signed_message(&signer, &body("hi"), &body("hi"));
    let verifier = DsigContext::new(
        wssec::crypto::AlgorithmRegistry::with_digests(&[algorithm::SHA256]).unwrap(),
    );
    let err = verify_message(&verifier, &message).unwrap_err();
    assert!(matches!(err, Error::UnsupportedAlgorithm(_)), "{err}");
}

#[test]
fn enveloped_signature_is_excluded_from_replay() {
    let message = concat!(
        r#"<s:Envelope xmlns:s="urn:soap"><s:Header>"#,
        r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo><ds:Reference URI=""/></ds:SignedInfo></ds:Signature>"#,
        r#"<s:To>urn:service</s:To></s:Header>"#,
        r#"<s:Body><p:Order xmlns:p="urn:p"><p:Item n="1"/></p:Order></s:Body></s:Envelope>"#
    );
    let without_signature = concat!(
        r#"<s:Envelope xmlns:s="urn:soap"><s:Header>"#,
        r#"<s:To>urn:service</s:To></s:Header>"#,
        r#"<s:Body><p:Order xmlns:p="urn:p"><p:Item n="1"/></p:Order></s:Body></s:Envelope>"#
    );

    let mut r = StreamReader::from_str(message);
    r.move_to_content().unwrap();
    let mut rec = RecordingReader::attach(&mut r).unwrap();
    rec.skip().unwrap();
    let mut buffer = rec.into_buffer().unwrap();
    buffer.set_exclusion(Exclusion::new(ns::node::SIGNATURE, ns::DSIG).at_depth(2));

    let replayed = {
        let mut driver = CanonicalizationDriver::default();
        driver.set_input_element(&buffer);
        driver.get_bytes().unwrap()
    };
    let expected = canonicalize(without_signature, C14nMode::Exclusive, &[]).unwrap();
    assert_eq!(String::from_utf8(replayed.clone()).unwrap(), String::from_utf8(expected).unwrap());
    roxmltree::Document::parse(std::str::from_utf8(&replayed).unwrap()).unwrap();

    // Without the exclusion the signature is back.
    buffer.clear_exclusion();
    let mut driver = CanonicalizationDriver::default();
    driver.set_input_element(&buffer);
    let full = driver.get_bytes().unwrap();
    assert_eq!(full, canonicalize(message, C14nMode::Exclusive, &[]).unwrap());
}
