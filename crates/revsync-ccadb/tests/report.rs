use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::routing::get;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::{X509, X509Builder, X509NameBuilder};
use revsync_ccadb::{Certificate, READY_TO_ADD, ReportError, fetch_report, from_reader, ready_to_add};
use revsync_identity::{Identity, IdentityKind, Record};
use tokio::net::TcpListener;

fn self_signed(common_name: &str, serial: u32) -> X509 {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COUNTRYNAME, "US").unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example Trust").unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    builder.build()
}

fn pem(cert: &X509) -> String {
    String::from_utf8(cert.to_pem().unwrap()).unwrap()
}

fn row(name: &str, status: &str, pem_info: String) -> Certificate {
    let mut row = Certificate::from_pem(pem_info);
    row.certificate_name = name.to_string();
    row.onecrl_status = status.to_string();
    row
}

fn to_csv(rows: &[Certificate]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).unwrap();
    }
    writer.into_inner().unwrap()
}

#[test]
fn rows_derive_both_identities_from_the_certificate() {
    let cert = self_signed("Example Intermediate", 256);
    let rows = from_reader(to_csv(&[row("a", READY_TO_ADD, format!("'{}'", pem(&cert)))]).as_slice())
        .unwrap();
    assert_eq!(rows.len(), 1);

    let issuer_serial = rows[0].issuer_serial().unwrap();
    assert_eq!(issuer_serial.kind(), IdentityKind::IssuerSerial);
    assert_eq!(
        issuer_serial.as_str(),
        "CN=Example Intermediate,O=Example Trust,C=US,AQA="
    );

    let subject_der = cert.subject_name().to_der().unwrap();
    let spki = cert.public_key().unwrap().public_key_to_der().unwrap();
    let hash = openssl::sha::sha256(&spki);
    let expected = Identity::from_der(IdentityKind::SubjectKeyHash, &subject_der, &hash).unwrap();
    assert_eq!(rows[0].subject_key_hash(), Some(expected));
}

#[test]
fn cached_identities_follow_the_pem_column() {
    let cert = self_signed("Cached Intermediate", 9);
    let quoted = format!("'{}'", pem(&cert));
    let row = row("cached", READY_TO_ADD, quoted.clone());
    let first = row.issuer_serial().unwrap();

    assert_eq!(row.pem_info(), quoted);
    let fresh = Certificate::from_pem(row.pem_info());
    assert_eq!(fresh.issuer_serial(), Some(first.clone()));
    assert_eq!(row.clone().issuer_serial(), Some(first));

    let rows = from_reader(to_csv(&[row]).as_slice()).unwrap();
    assert_eq!(rows[0].pem_info(), quoted);
    assert_eq!(rows[0].subject_key_hash(), fresh.subject_key_hash());
}

#[test]
fn only_ready_to_add_rows_enter_the_set() {
    let first = self_signed("First", 1);
    let second = self_signed("Second", 2);
    let report = vec![
        row("first", READY_TO_ADD, pem(&first)),
        row("second", "Added to OneCRL", pem(&second)),
        row("broken", READY_TO_ADD, "''".to_string()),
    ];

    let set = ready_to_add(report);
    assert_eq!(set.len(), 1);
    assert_eq!(set.issuer_serial_len(), 1);
    assert_eq!(set.subject_key_hash_len(), 1);
    assert_eq!(set.iter().next().unwrap().certificate_name, "first");
}

#[test]
fn report_and_store_encodings_reconcile() {
    let cert = self_signed("Shared", 0x00ff_ee01);
    let report = ready_to_add(vec![row("shared", READY_TO_ADD, pem(&cert))]);

    let (issuer, serial) = report
        .iter()
        .next()
        .unwrap()
        .raw_issuer_serial()
        .unwrap();
    assert_eq!(serial, [0xff, 0xee, 0x01]);
    let stored = Identity::from_der(IdentityKind::IssuerSerial, &issuer, &serial).unwrap();
    let entry = report.iter().next().unwrap();
    assert_eq!(entry.issuer_serial(), Some(stored));
}

#[test]
fn missing_columns_fail_the_report() {
    let csv = "CA Owner,OneCRL Status,PEM Info\nExample,Ready to Add,''\n";
    assert!(matches!(
        from_reader(csv.as_bytes()),
        Err(ReportError::Csv(_))
    ));
}

#[test]
fn column_order_does_not_matter() {
    let cert = self_signed("Reordered", 7);
    let original = to_csv(&[row("reordered", READY_TO_ADD, pem(&cert))]);
    let mut reader = csv::Reader::from_reader(original.as_slice());
    let headers: Vec<String> = reader.headers().unwrap().iter().rev().map(str::to_string).collect();
    let record: Vec<String> = reader
        .records()
        .next()
        .unwrap()
        .unwrap()
        .iter()
        .rev()
        .map(str::to_string)
        .collect();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers).unwrap();
    writer.write_record(&record).unwrap();
    let reordered = writer.into_inner().unwrap();

    let rows = from_reader(reordered.as_slice()).unwrap();
    assert_eq!(rows[0].certificate_name, "reordered");
    assert!(rows[0].issuer_serial().is_some());
}

async fn loopback_available() -> bool {
    TcpListener::bind("127.0.0.1:0").await.is_ok()
}

#[tokio::test]
async fn fetches_report_over_http() {
    if !loopback_available().await {
        eprintln!("skipping fetches_report_over_http: loopback bind not permitted");
        return;
    }
    let cert = self_signed("Fetched", 3);
    let body = to_csv(&[row("fetched", READY_TO_ADD, pem(&cert))]);
    let app = axum::Router::new()
        .route("/report.csv", get(move || async move { body }))
        .route(
            "/missing.csv",
            get(|| async { (StatusCode::NOT_FOUND, "no such report") }),
        );
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind listener");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let rows = fetch_report(&format!("http://{addr}/report.csv")).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(ready_to_add(rows).len(), 1);

    match fetch_report(&format!("http://{addr}/missing.csv")).await {
        Err(ReportError::UnexpectedStatus { status, .. }) => {
            assert_eq!(status, StatusCode::NOT_FOUND)
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}
