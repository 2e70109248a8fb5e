mod util;

use certforge::error::Error;
use certforge::store::{Keystore, StoreFormat};

fn populated(format: StoreFormat) -> Keystore {
    let (chain, leaf_key) = util::three_level_chain();
    let root = chain.last().unwrap().clone();

    let mut store = Keystore::new(format);
    store
        .set_key_entry("entity", &leaf_key, "changeit", chain)
        .unwrap();
    store.set_certificate_entry("root", root).unwrap();
    store
}

#[test]
fn jks_round_trip_preserves_entries() {
    round_trip(StoreFormat::Jks);
}

#[test]
fn pkcs12_round_trip_preserves_entries() {
    round_trip(StoreFormat::Pkcs12);
}

fn round_trip(format: StoreFormat) {
    let store = populated(format);
    let bytes = store.store("changeit").unwrap();

    let reloaded = Keystore::load(format, &bytes, "changeit").unwrap();
    assert_eq!(reloaded.aliases().len(), 2);
    assert!(reloaded.is_key_entry("entity"));
    assert!(!reloaded.is_key_entry("root"));

    let chain = reloaded.certificate_chain("entity").unwrap();
    assert_eq!(chain.len(), 3);
    assert_eq!(Some(&chain[0]), store.certificate("entity").as_ref());
    assert_eq!(
        reloaded.certificate("root"),
        store.certificate("root")
    );

    let key = reloaded.key("entity", "changeit").unwrap();
    assert_eq!(
        key.public_key(),
        store.key("entity", "changeit").unwrap().public_key()
    );
}

#[test]
fn jks_load_rejects_a_wrong_password() {
    let bytes = populated(StoreFormat::Jks).store("changeit").unwrap();
    let result = Keystore::load(StoreFormat::Jks, &bytes, "wrong");
    assert!(matches!(result, Err(Error::Container(_))));
}

#[test]
fn pkcs12_load_rejects_a_wrong_password() {
    let bytes = populated(StoreFormat::Pkcs12).store("changeit").unwrap();
    assert!(Keystore::load(StoreFormat::Pkcs12, &bytes, "wrong").is_err());
}

#[test]
fn key_recovery_needs_the_entry_password() {
    let store = populated(StoreFormat::Jks);
    assert!(store.key("entity", "wrong").is_err());
    assert!(store.key("root", "changeit").is_err());
    assert!(store.key("missing", "changeit").is_err());
}

#[test]
fn certificate_alias_finds_the_exact_certificate() {
    let store = populated(StoreFormat::Jks);

    let leaf = store.certificate("entity").unwrap();
    assert_eq!(store.certificate_alias(&leaf).as_deref(), Some("entity"));

    let root = store.certificate("root").unwrap();
    assert_eq!(store.certificate_alias(&root).as_deref(), Some("root"));

    let (stranger, _) = util::self_signed_ca("Stranger", 42);
    assert_eq!(store.certificate_alias(&stranger), None);
}

#[test]
fn delete_entry_removes_only_the_named_alias() {
    let mut store = populated(StoreFormat::Jks);
    store.delete_entry("root");
    assert_eq!(store.aliases(), vec!["entity".to_string()]);
    store.delete_entry("missing");
    assert_eq!(store.aliases().len(), 1);
}

#[test]
fn certificate_entries_cannot_displace_key_entries() {
    let mut store = populated(StoreFormat::Jks);
    let root = store.certificate("root").unwrap();
    let result = store.set_certificate_entry("entity", root);
    assert!(matches!(result, Err(Error::Container(_))));
}
