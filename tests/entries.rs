mod util;

use certforge::entry::{self, EntryKind, KeystoreEntry};
use certforge::error::Error;
use certforge::store::{Keystore, StoreFormat};

fn key_entry(alias: &str) -> KeystoreEntry {
    let (certificate, key) = util::self_signed_ca(alias, 1);
    KeystoreEntry::PrivateKey {
        alias: alias.to_string(),
        key,
        chain: vec![certificate],
    }
}

fn cert_entry(alias: &str) -> KeystoreEntry {
    let (certificate, _) = util::self_signed_ca(alias, 2);
    KeystoreEntry::TrustedCertificate {
        alias: alias.to_string(),
        certificate,
    }
}

#[test]
fn type_alias_order_puts_keys_first_then_sorts_by_alias() {
    let mut entries = vec![cert_entry("bravo"), key_entry("Charlie"), key_entry("alpha")];
    entries.sort_by(entry::type_alias_order);

    let summary: Vec<(EntryKind, &str)> = entries
        .iter()
        .map(|entry| (entry.kind(), entry.alias()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (EntryKind::Key, "alpha"),
            (EntryKind::Key, "Charlie"),
            (EntryKind::TrustedCertificate, "bravo"),
        ]
    );
}

#[test]
fn alias_order_ignores_kind_and_case() {
    let mut entries = vec![key_entry("Zulu"), cert_entry("alpha"), key_entry("MIKE")];
    entries.sort_by(entry::alias_order);

    let aliases: Vec<&str> = entries.iter().map(KeystoreEntry::alias).collect();
    assert_eq!(aliases, vec!["alpha", "MIKE", "Zulu"]);
}

#[test]
fn identity_is_kind_plus_case_insensitive_alias() {
    assert_eq!(key_entry("Server"), key_entry("sErVeR"));
    assert_ne!(key_entry("server"), cert_entry("server"));
    assert_ne!(key_entry("server"), key_entry("other"));
}

#[test]
fn copy_changes_only_the_alias() {
    let original = cert_entry("original");
    let copied = original.copy("renamed");

    assert_eq!(copied.alias(), "renamed");
    assert_eq!(copied.kind(), EntryKind::TrustedCertificate);
    assert_eq!(copied.certificate(), original.certificate());
}

#[test]
fn subject_name_prefers_the_certificate_common_name() {
    let entry = cert_entry("some alias");
    assert_eq!(entry.subject_name(), "some alias".to_string());

    let (certificate, _) = util::self_signed_ca("Named Subject", 3);
    let entry = KeystoreEntry::TrustedCertificate {
        alias: "other alias".to_string(),
        certificate,
    };
    assert_eq!(entry.subject_name(), "Named Subject");
}

#[test]
fn add_to_and_list_all_round_trip_through_a_container() {
    let mut store = Keystore::new(StoreFormat::Jks);
    key_entry("server").add_to(&mut store, "changeit").unwrap();
    cert_entry("root").add_to(&mut store, "ignored").unwrap();

    let everything = KeystoreEntry::list_all(&store, true, true, "changeit").unwrap();
    assert_eq!(everything.len(), 2);
    assert_eq!(everything[0].kind(), EntryKind::Key);
    assert_eq!(everything[1].kind(), EntryKind::TrustedCertificate);

    let only_certs = KeystoreEntry::list_all(&store, false, true, "").unwrap();
    assert_eq!(only_certs.len(), 1);
    assert_eq!(only_certs[0].alias(), "root");

    let only_keys = KeystoreEntry::list_all(&store, true, false, "changeit").unwrap();
    assert_eq!(only_keys.len(), 1);
    assert_eq!(only_keys[0].alias(), "server");
}

#[test]
fn key_entries_need_a_non_empty_password() {
    let mut store = Keystore::new(StoreFormat::Jks);
    let result = key_entry("server").add_to(&mut store, "");
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(store.aliases().is_empty());
}
