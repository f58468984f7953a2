//! Round-trip and comparison properties over generated trees

use dirsnap::artifact::{ArtifactDocument, ArtifactHeader, EncodingPolicy, Serializer};
use dirsnap::compare::{Comparator, CompareOptions};
use dirsnap::tree::entry::TreeEntry;
use dirsnap::tree::path::{escape_field, unescape_field, RelPath};
use dirsnap::tree::snapshot::TreeSnapshot;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// A path segment: printable names including spaces, `%`, and non-ASCII.
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 %_\\-\u{e9}\u{65e5}]{1,8}".prop_filter("not a relative marker", |s| {
        s != "." && s != ".."
    })
}

/// File paths with arbitrary contents; no path is an ancestor of another.
fn file_tree() -> impl Strategy<Value = BTreeMap<RelPath, Vec<u8>>> {
    prop::collection::btree_map(
        prop::collection::vec(segment(), 1..4),
        prop::collection::vec(any::<u8>(), 0..64),
        0..12,
    )
    .prop_map(|files| {
        let mut tree: BTreeMap<RelPath, Vec<u8>> = BTreeMap::new();
        for (segments, content) in files {
            let path = RelPath::from_segments(segments).unwrap();
            let clashes = tree
                .keys()
                .any(|p| p.is_ancestor_of(&path) || path.is_ancestor_of(p) || *p == path);
            if !clashes {
                tree.insert(path, content);
            }
        }
        tree
    })
}

fn entries(tree: &BTreeMap<RelPath, Vec<u8>>) -> Vec<TreeEntry> {
    tree.iter()
        .map(|(path, content)| TreeEntry::file(path.clone(), content.clone(), Some(0o644)))
        .collect()
}

fn serialize(tree: &BTreeMap<RelPath, Vec<u8>>, policy: EncodingPolicy) -> Vec<u8> {
    let mut out = Vec::new();
    Serializer::new(policy)
        .write(
            &mut out,
            &ArtifactHeader::new("root"),
            entries(tree).into_iter().map(Ok),
        )
        .unwrap();
    out
}

fn snapshot(tree: &BTreeMap<RelPath, Vec<u8>>) -> TreeSnapshot {
    let mut snapshot = TreeSnapshot::new("root");
    for entry in entries(tree) {
        snapshot.insert(entry.path.clone(), (&entry).into());
    }
    snapshot
}

proptest! {
    #[test]
    fn test_serialize_parse_roundtrip(tree in file_tree(), base64 in any::<bool>()) {
        let policy = if base64 { EncodingPolicy::Base64 } else { EncodingPolicy::Auto };
        let bytes = serialize(&tree, policy);
        let document = ArtifactDocument::parse(bytes.as_slice()).unwrap();

        let parsed: BTreeMap<RelPath, Vec<u8>> = document
            .files()
            .map(|e| (e.path.clone(), e.content.clone()))
            .collect();
        prop_assert_eq!(parsed, tree);
    }

    #[test]
    fn test_compare_with_self_is_empty(tree in file_tree()) {
        let snap = snapshot(&tree);
        let diff = Comparator::new(CompareOptions::default()).compare(&snap, &snap);
        prop_assert!(diff.is_empty());
    }

    #[test]
    fn test_compare_is_symmetric(left in file_tree(), right in file_tree()) {
        let comparator = Comparator::new(CompareOptions::default());
        let forward = comparator.compare(&snapshot(&left), &snapshot(&right));
        let backward = comparator.compare(&snapshot(&right), &snapshot(&left));

        prop_assert_eq!(&forward.added, &backward.removed);
        prop_assert_eq!(&forward.removed, &backward.added);
        prop_assert_eq!(
            forward.modified.keys().collect::<Vec<_>>(),
            backward.modified.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_escape_field_roundtrip(value in "\\PC*|[\r\n%]{0,6}") {
        let escaped = escape_field(&value);
        prop_assert!(!escaped.contains('\n'));
        prop_assert!(!escaped.contains('\r'));
        prop_assert_eq!(unescape_field(&escaped).unwrap(), value);
    }
}
